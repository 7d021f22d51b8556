pub mod aggregate;
pub mod leg;
pub mod metrics;
pub mod payoff;
pub mod probability;

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::StrategyError;
use crate::market::MarketParameters;
use crate::pricing::TerminalDistribution;
use crate::types::*;
use crate::StrategyResult;

pub use aggregate::{PlCurve, PriceGrid};
pub use leg::{OptionLeg, StockLeg, StrategyLeg};
pub use metrics::{LegAnalytics, RiskMetrics};

/// Default grid resolution: a 0.05 step on a [50, 150] domain.
pub const DEFAULT_GRID_POINTS: usize = 2001;

/// Upper bound on grid resolution, which bounds the cost of one evaluation.
pub const MAX_GRID_POINTS: usize = 100_001;

/// Share of the terminal distribution the grid must capture before a
/// truncation warning is raised.
const MASS_WARNING_THRESHOLD: f64 = 0.99;

fn default_grid_points() -> usize {
    DEFAULT_GRID_POINTS
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,
    /// P/L level whose probability of being reached is reported.
    #[serde(default)]
    pub profit_target: Option<f64>,
    /// Negative P/L level whose probability of being hit is reported.
    #[serde(default)]
    pub loss_limit: Option<f64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            grid_points: DEFAULT_GRID_POINTS,
            profit_target: None,
            loss_limit: None,
        }
    }
}

fn validate_config(config: &EvaluationConfig) -> StrategyResult<()> {
    if config.grid_points < 2 || config.grid_points > MAX_GRID_POINTS {
        return Err(StrategyError::invalid(
            "grid_points",
            format!("must be between 2 and {}", MAX_GRID_POINTS),
        ));
    }
    if let Some(target) = config.profit_target {
        if !target.is_finite() || target <= 0.0 {
            return Err(StrategyError::invalid("profit_target", "must be positive"));
        }
    }
    if let Some(limit) = config.loss_limit {
        if !limit.is_finite() || limit >= 0.0 {
            return Err(StrategyError::invalid("loss_limit", "must be negative"));
        }
    }
    Ok(())
}

fn validate_legs(legs: &[StrategyLeg], market: &MarketParameters) -> StrategyResult<()> {
    for (i, leg) in legs.iter().enumerate() {
        leg.validate(i, market)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the inputs and build the P/L curve at the target date.
pub fn evaluate_curve(
    market: &MarketParameters,
    legs: &[StrategyLeg],
    config: &EvaluationConfig,
) -> StrategyResult<PlCurve> {
    validate_config(config)?;
    validate_legs(legs, market)?;
    aggregate::build_curve(legs, market, config.grid_points)
}

/// Evaluate a strategy: P/L profile at the target date and its risk metrics
/// under the lognormal terminal-price model.
///
/// Either every metric is computed or the call fails on the first invalid
/// input; nothing is partially returned.
pub fn evaluate(
    market: &MarketParameters,
    legs: &[StrategyLeg],
    config: &EvaluationConfig,
) -> StrategyResult<ComputationOutput<RiskMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let curve = evaluate_curve(market, legs, config)?;
    debug!(
        legs = legs.len(),
        grid_points = curve.grid.len(),
        strategy_cost = curve.strategy_cost,
        "built P/L curve"
    );

    let horizon = market.time_to_target();
    let dist = TerminalDistribution::new(
        market.stock_price(),
        market.volatility(),
        market.interest_rate(),
        market.dividend_yield(),
        horizon,
    )?;
    let weights = probability::grid_weights(&curve.grid, &dist);

    match &weights {
        Some(gw) if gw.captured_mass < MASS_WARNING_THRESHOLD => {
            warn!(captured_mass = gw.captured_mass, "price grid truncates the distribution");
            warnings.push(format!(
                "Price grid captures {:.2}% of the terminal price distribution; \
                 probabilities are normalized to the grid",
                gw.captured_mass * 100.0
            ));
        }
        None => {
            warn!("terminal price distribution has no mass inside the price grid");
            warnings.push(
                "Terminal price distribution lies outside the price grid; \
                 probabilities are undefined"
                    .to_string(),
            );
        }
        _ => {}
    }

    let summary = probability::summarize(
        &curve,
        weights.as_ref(),
        config.profit_target,
        config.loss_limit,
    );

    let profit_ranges = metrics::profit_ranges(&curve);
    let (lo, hi) = (curve.grid.min(), curve.grid.max());
    if profit_ranges.iter().any(|&(a, b)| a <= lo || b >= hi) {
        warnings.push(
            "Profitable region extends past the price grid; \
             probability of profit is a lower bound"
                .to_string(),
        );
    }
    if legs.is_empty() {
        warnings.push("Strategy has no legs".to_string());
    }

    let profit_target_ranges = match config.profit_target {
        Some(target) => {
            metrics::ranges_where(curve.grid.prices(), &curve.values, target, |v| v >= target)
        }
        None => Vec::new(),
    };
    let loss_limit_ranges = match config.loss_limit {
        Some(limit) => {
            metrics::ranges_where(curve.grid.prices(), &curve.values, limit, |v| v <= limit)
        }
        None => Vec::new(),
    };

    let (maximum_return_in_domain, minimum_return_in_domain) =
        metrics::domain_extremes(&curve, legs, market);

    let output = RiskMetrics {
        probability_of_profit: summary.probability_of_profit.and_then(finite),
        profit_ranges,
        expected_profit: summary.expected_profit,
        expected_loss: summary.expected_loss,
        maximum_return_in_domain,
        minimum_return_in_domain,
        strategy_cost: curve.strategy_cost,
        per_leg_cost: curve.per_leg_cost.clone(),
        probability_of_profit_target: summary.probability_of_profit_target,
        profit_target_ranges,
        probability_of_loss_limit: summary.probability_of_loss_limit,
        loss_limit_ranges,
        leg_analytics: metrics::leg_analytics(legs, market),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    debug!(elapsed_us = elapsed, "strategy evaluated");
    Ok(with_metadata(
        "Black-Scholes strategy evaluation: lognormal terminal price on a discretized grid",
        &serde_json::json!({
            "stock_price": market.stock_price(),
            "volatility": market.volatility(),
            "interest_rate": market.interest_rate(),
            "dividend_yield": market.dividend_yield(),
            "start_date": market.start_date().to_string(),
            "target_date": market.target_date().to_string(),
            "days_to_target": (market.target_date() - market.start_date()).num_days(),
            "price_domain": format!("{} - {}", lo, hi),
            "grid_points": curve.grid.len(),
            "grid_step": curve.grid.step(),
            "num_legs": legs.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
