use serde::{Deserialize, Serialize};

use crate::market::MarketParameters;
use crate::pricing::black_scholes::{self, OptionGreeks, OptionInput};
use crate::types::*;

use super::aggregate::{net_pl_at, PlCurve};
use super::leg::{OptionLeg, StrategyLeg};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Per-leg analytics at the valuation date, per unit (not scaled by `n`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegAnalytics {
    pub leg_index: usize,
    pub leg_type: String,
    pub multiplier: f64,
    /// Model price today (spot for stock legs)
    pub model_price: Option<Price>,
    pub greeks: OptionGreeks,
    /// Risk-neutral probability of expiring in the money; stock legs have none
    pub itm_probability: Option<f64>,
}

/// Risk/reward summary of a strategy at the target date.
///
/// `None` marks a metric that is undefined for the inputs. It is never a
/// stand-in for zero: a computed zero is `Some(0.0)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub probability_of_profit: Option<f64>,
    pub profit_ranges: Vec<(Price, Price)>,
    pub expected_profit: Option<f64>,
    pub expected_loss: Option<f64>,
    pub maximum_return_in_domain: Option<f64>,
    pub minimum_return_in_domain: Option<f64>,
    pub strategy_cost: f64,
    pub per_leg_cost: Vec<f64>,
    pub probability_of_profit_target: Option<f64>,
    pub profit_target_ranges: Vec<(Price, Price)>,
    pub probability_of_loss_limit: Option<f64>,
    pub loss_limit_ranges: Vec<(Price, Price)>,
    pub leg_analytics: Vec<LegAnalytics>,
}

// ---------------------------------------------------------------------------
// Range scanning
// ---------------------------------------------------------------------------

/// Price where `level - v` changes sign between two neighbouring grid points.
fn crossing(p0: Price, v0: f64, p1: Price, v1: f64, level: f64) -> Price {
    let dv = v1 - v0;
    if dv == 0.0 {
        return p1;
    }
    let t = ((level - v0) / dv).clamp(0.0, 1.0);
    p0 + t * (p1 - p0)
}

/// Maximal runs of grid points whose P/L satisfies `inside`, reported as
/// `[low, high]` price intervals.
///
/// Interior endpoints are refined by linear interpolation against `level`
/// between the last point outside the run and the first point inside it, so
/// a breakeven is resolved below the grid step. Endpoints at the grid edge
/// stay at the edge.
pub fn ranges_where(
    prices: &[Price],
    values: &[f64],
    level: f64,
    inside: impl Fn(f64) -> bool,
) -> Vec<(Price, Price)> {
    let n = prices.len().min(values.len());
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < n {
        if !inside(values[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i + 1 < n && inside(values[i + 1]) {
            i += 1;
        }
        let end = i;

        let low = if start == 0 {
            prices[0]
        } else {
            crossing(
                prices[start - 1],
                values[start - 1],
                prices[start],
                values[start],
                level,
            )
        };
        let high = if end == n - 1 {
            prices[n - 1]
        } else {
            crossing(prices[end], values[end], prices[end + 1], values[end + 1], level)
        };
        ranges.push((low, high));
        i += 1;
    }
    ranges
}

pub fn profit_ranges(curve: &PlCurve) -> Vec<(Price, Price)> {
    ranges_where(curve.grid.prices(), &curve.values, 0.0, |v| v > 0.0)
}

/// Interpolated breakeven prices: every interior endpoint of a profit range.
pub fn breakevens(curve: &PlCurve) -> Vec<Price> {
    let (lo, hi) = (curve.grid.min(), curve.grid.max());
    profit_ranges(curve)
        .into_iter()
        .flat_map(|(a, b)| [a, b])
        .filter(|&p| p > lo && p < hi)
        .collect()
}

// ---------------------------------------------------------------------------
// Extremes
// ---------------------------------------------------------------------------

/// Max and min P/L over the domain.
///
/// Besides the grid points, the curve is evaluated exactly at every strike
/// inside the domain, where payoffs held to expiry have their kinks. A capped
/// payoff therefore reports its true cap rather than a grid-rounded value.
pub fn domain_extremes(
    curve: &PlCurve,
    legs: &[StrategyLeg],
    market: &MarketParameters,
) -> (Option<f64>, Option<f64>) {
    let (lo, hi) = (curve.grid.min(), curve.grid.max());
    let kinks = legs
        .iter()
        .filter_map(|leg| leg.strike())
        .filter(|k| *k >= lo && *k <= hi)
        .map(|k| net_pl_at(legs, market, curve.strategy_cost, k));

    let (max, min) = curve
        .values
        .iter()
        .copied()
        .chain(kinks)
        .filter(|v| v.is_finite())
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(mx, mn), v| {
            (mx.max(v), mn.min(v))
        });
    (finite(max), finite(min))
}

// ---------------------------------------------------------------------------
// Leg analytics
// ---------------------------------------------------------------------------

/// Model price, greeks and ITM probability today for an option expiring on
/// its own date (the target date when none is given).
fn option_analytics(
    leg: &OptionLeg,
    option_type: OptionType,
    market: &MarketParameters,
) -> (Option<Price>, OptionGreeks, Option<f64>) {
    let expiration = leg.expiration.unwrap_or_else(|| market.target_date());
    let input = OptionInput {
        spot_price: market.stock_price(),
        strike_price: leg.strike,
        volatility: market.volatility(),
        risk_free_rate: market.interest_rate(),
        dividend_yield: market.dividend_yield(),
        time_to_expiry: market.years_between(market.start_date(), expiration),
        option_type,
    };
    match black_scholes::value_option(&input) {
        Ok(v) => (finite(v.price), v.greeks, finite(v.itm_probability)),
        Err(_) => (None, OptionGreeks::default(), None),
    }
}

pub fn leg_analytics(legs: &[StrategyLeg], market: &MarketParameters) -> Vec<LegAnalytics> {
    legs.iter()
        .enumerate()
        .map(|(i, leg)| {
            let (model_price, greeks, itm_probability) = match leg {
                StrategyLeg::Stock(_) => (
                    Some(market.stock_price()),
                    OptionGreeks {
                        delta: 1.0,
                        ..OptionGreeks::default()
                    },
                    None,
                ),
                StrategyLeg::Call(o) => option_analytics(o, OptionType::Call, market),
                StrategyLeg::Put(o) => option_analytics(o, OptionType::Put, market),
            };
            LegAnalytics {
                leg_index: i,
                leg_type: leg.type_name().to_string(),
                multiplier: leg.multiplier(),
                model_price,
                greeks,
                itm_probability,
            }
        })
        .collect()
}
