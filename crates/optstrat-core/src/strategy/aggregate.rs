use serde::{Deserialize, Serialize};

use crate::error::StrategyError;
use crate::market::MarketParameters;
use crate::types::*;
use crate::StrategyResult;

use super::leg::StrategyLeg;
use super::payoff::{leg_cost, leg_value};

// ---------------------------------------------------------------------------
// Price grid
// ---------------------------------------------------------------------------

/// Evenly spaced, ascending underlying prices covering `[min, max]` inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGrid {
    prices: Vec<Price>,
}

impl PriceGrid {
    pub fn new(min: Price, max: Price, points: usize) -> StrategyResult<Self> {
        if points < 2 {
            return Err(StrategyError::invalid("grid_points", "must be at least 2"));
        }
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(StrategyError::invalid(
                "price_grid",
                "lower bound must be below upper bound",
            ));
        }
        let last = (points - 1) as f64;
        let span = max - min;
        let mut prices: Vec<Price> = (0..points)
            .map(|i| min + span * (i as f64) / last)
            .collect();
        // Pin the upper edge exactly
        prices[points - 1] = max;
        Ok(PriceGrid { prices })
    }

    pub fn prices(&self) -> &[Price] {
        &self.prices
    }

    /// Number of grid points; never below two.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn min(&self) -> Price {
        self.prices[0]
    }

    pub fn max(&self) -> Price {
        self.prices[self.prices.len() - 1]
    }

    pub fn step(&self) -> Price {
        self.prices[1] - self.prices[0]
    }
}

// ---------------------------------------------------------------------------
// P/L curve
// ---------------------------------------------------------------------------

/// Net strategy P/L at the target date, one value per grid price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlCurve {
    pub grid: PriceGrid,
    pub values: Vec<f64>,
    pub strategy_cost: f64,
    pub per_leg_cost: Vec<f64>,
}

impl PlCurve {
    /// (price, P/L) pairs, in grid order.
    pub fn points(&self) -> impl Iterator<Item = (Price, f64)> + '_ {
        self.grid.prices().iter().copied().zip(self.values.iter().copied())
    }
}

/// Net debit (positive) or credit (negative) to open the strategy, with the
/// per-leg breakdown.
pub fn strategy_cost(legs: &[StrategyLeg], market: &MarketParameters) -> (f64, Vec<f64>) {
    let per_leg: Vec<f64> = legs.iter().map(|leg| leg_cost(leg, market)).collect();
    let total = per_leg.iter().sum();
    (total, per_leg)
}

/// Net P/L of the whole strategy with the underlying at `s`.
pub fn net_pl_at(legs: &[StrategyLeg], market: &MarketParameters, cost: f64, s: Price) -> f64 {
    let value: f64 = legs.iter().map(|leg| leg_value(leg, s, market)).sum();
    value - cost
}

/// Build the grid and evaluate every leg at every grid price.
///
/// Legs are assumed validated. An empty strategy yields a flat zero curve.
pub fn build_curve(
    legs: &[StrategyLeg],
    market: &MarketParameters,
    grid_points: usize,
) -> StrategyResult<PlCurve> {
    let grid = PriceGrid::new(market.min_stock(), market.max_stock(), grid_points)?;
    let (cost, per_leg_cost) = strategy_cost(legs, market);
    let values = grid
        .prices()
        .iter()
        .map(|&s| net_pl_at(legs, market, cost, s))
        .collect();
    Ok(PlCurve {
        grid,
        values,
        strategy_cost: cost,
        per_leg_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketInput;
    use chrono::NaiveDate;

    fn market() -> MarketParameters {
        MarketParameters::new(MarketInput {
            stock_price: 100.0,
            volatility: 0.2,
            interest_rate: 0.0,
            dividend_yield: 0.0,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            target_date: NaiveDate::from_ymd_opt(2026, 2, 4).unwrap(),
            min_stock: 50.0,
            max_stock: 150.0,
            days_in_year: 365,
        })
        .unwrap()
    }

    #[test]
    fn test_grid_spans_bounds() {
        let g = PriceGrid::new(50.0, 150.0, 101).unwrap();
        assert_eq!(g.len(), 101);
        assert_eq!(g.min(), 50.0);
        assert_eq!(g.max(), 150.0);
        assert!((g.step() - 1.0).abs() < 1e-12);
        assert!(g.prices().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_grid_rejects_degenerate() {
        assert!(PriceGrid::new(50.0, 150.0, 1).is_err());
        assert!(PriceGrid::new(150.0, 50.0, 10).is_err());
    }

    #[test]
    fn test_empty_strategy_flat_zero() {
        let curve = build_curve(&[], &market(), 201).unwrap();
        assert_eq!(curve.strategy_cost, 0.0);
        assert!(curve.per_leg_cost.is_empty());
        assert!(curve.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_bull_call_spread_curve() {
        let legs = vec![
            StrategyLeg::call(95.0, 7.0, 1, Action::Buy),
            StrategyLeg::call(105.0, 2.0, 1, Action::Sell),
        ];
        let curve = build_curve(&legs, &market(), 101).unwrap();
        assert_eq!(curve.strategy_cost, 5.0);
        assert_eq!(curve.per_leg_cost, vec![7.0, -2.0]);
        // Below both strikes: lose the debit
        assert!((curve.values[0] + 5.0).abs() < 1e-12);
        // Above both strikes: width minus debit
        assert!((curve.values[100] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_offsetting_legs_cancel() {
        let legs = vec![
            StrategyLeg::put(98.0, 3.1, 2, Action::Buy),
            StrategyLeg::put(98.0, 3.1, 2, Action::Sell),
        ];
        let curve = build_curve(&legs, &market(), 501).unwrap();
        assert_eq!(curve.strategy_cost, 0.0);
        assert!(curve.values.iter().all(|&v| v == 0.0));
    }
}
