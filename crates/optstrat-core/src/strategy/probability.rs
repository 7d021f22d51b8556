use serde::{Deserialize, Serialize};

use crate::pricing::TerminalDistribution;
use crate::types::*;

use super::aggregate::{PlCurve, PriceGrid};

/// Probability mass attached to each grid price, normalized over the grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridWeights {
    pub weights: Vec<f64>,
    /// Mass the distribution actually places inside `[min, max]` before
    /// normalization. Below 1 the domain truncates the distribution.
    pub captured_mass: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub probability_of_profit: Option<f64>,
    pub expected_profit: Option<f64>,
    pub expected_loss: Option<f64>,
    pub probability_of_profit_target: Option<f64>,
    pub probability_of_loss_limit: Option<f64>,
}

/// Discretize the terminal distribution onto the grid.
///
/// Grid point `i` owns the cell between the midpoints to its neighbours; the
/// outermost cells end at the grid bounds. Returns `None` when the
/// distribution puts no mass inside the domain.
pub fn grid_weights(grid: &PriceGrid, dist: &TerminalDistribution) -> Option<GridWeights> {
    let prices = grid.prices();
    let n = prices.len();

    if let TerminalDistribution::PointMass(x) = dist {
        if *x < grid.min() || *x > grid.max() {
            return None;
        }
        let nearest = prices
            .iter()
            .enumerate()
            .min_by(|a, b| (a.1 - x).abs().total_cmp(&(b.1 - x).abs()))
            .map(|(i, _)| i)?;
        let mut weights = vec![0.0; n];
        weights[nearest] = 1.0;
        return Some(GridWeights {
            weights,
            captured_mass: 1.0,
        });
    }

    let mut bounds = Vec::with_capacity(n + 1);
    bounds.push(grid.min());
    bounds.extend(prices.windows(2).map(|w| 0.5 * (w[0] + w[1])));
    bounds.push(grid.max());

    let cdf: Vec<f64> = bounds.iter().map(|&b| dist.cdf(b)).collect();
    let raw: Vec<f64> = cdf.windows(2).map(|c| (c[1] - c[0]).max(0.0)).collect();
    let total: f64 = raw.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    Some(GridWeights {
        weights: raw.iter().map(|w| w / total).collect(),
        captured_mass: total,
    })
}

/// Total weight of the grid points whose P/L satisfies `pred`.
pub fn probability_where(values: &[f64], weights: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    values
        .iter()
        .zip(weights)
        .filter(|(v, _)| pred(**v))
        .map(|(_, w)| *w)
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Probability-weighted mean P/L over the points satisfying `pred`.
/// `None` when no point qualifies or the qualifying points carry no weight.
pub fn conditional_mean(
    values: &[f64],
    weights: &[f64],
    pred: impl Fn(f64) -> bool,
) -> Option<f64> {
    let (mass, weighted) = values
        .iter()
        .zip(weights)
        .filter(|(v, _)| pred(**v))
        .fold((0.0, 0.0), |(m, s), (v, w)| (m + w, s + w * v));
    if mass > 0.0 {
        finite(weighted / mass)
    } else {
        None
    }
}

/// Distributional metrics of the P/L curve under the given grid weights.
///
/// `weights == None` (no mass in the domain) leaves every probability
/// undefined.
pub fn summarize(
    curve: &PlCurve,
    weights: Option<&GridWeights>,
    profit_target: Option<f64>,
    loss_limit: Option<f64>,
) -> DistributionSummary {
    let Some(gw) = weights else {
        return DistributionSummary::default();
    };
    let values = &curve.values;
    let w = &gw.weights;

    DistributionSummary {
        probability_of_profit: Some(probability_where(values, w, |v| v > 0.0)),
        expected_profit: conditional_mean(values, w, |v| v > 0.0),
        expected_loss: conditional_mean(values, w, |v| v < 0.0),
        probability_of_profit_target: profit_target
            .map(|target| probability_where(values, w, |v| v >= target)),
        probability_of_loss_limit: loss_limit
            .map(|limit| probability_where(values, w, |v| v <= limit)),
    }
}
