use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, LogNormal};
use statrs::function::erf::erfc;

use crate::error::StrategyError;
use crate::types::*;
use crate::StrategyResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionInput {
    pub spot_price: Price,
    pub strike_price: Price,
    pub volatility: Rate,
    pub risk_free_rate: Rate,
    #[serde(default)]
    pub dividend_yield: Rate,
    pub time_to_expiry: Years,
    pub option_type: OptionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionGreeks {
    pub delta: f64,
    pub gamma: f64,
    /// Per calendar day
    pub theta: f64,
    /// Per 1% volatility move
    pub vega: f64,
    /// Per 1% rate move
    pub rho: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionValuation {
    pub price: Price,
    pub intrinsic_value: Price,
    pub time_value: Price,
    pub greeks: OptionGreeks,
    pub itm_probability: f64,
}

// ---------------------------------------------------------------------------
// Normal distribution helpers
// ---------------------------------------------------------------------------

/// Standard normal CDF via the complementary error function.
pub(crate) fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

pub(crate) fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_pricing_input(input: &OptionInput) -> StrategyResult<()> {
    if !input.spot_price.is_finite() || input.spot_price <= 0.0 {
        return Err(StrategyError::invalid("spot_price", "must be positive"));
    }
    if !input.strike_price.is_finite() || input.strike_price <= 0.0 {
        return Err(StrategyError::invalid("strike_price", "must be positive"));
    }
    if !input.volatility.is_finite() || input.volatility < 0.0 {
        return Err(StrategyError::invalid("volatility", "must be non-negative"));
    }
    if !input.time_to_expiry.is_finite() || input.time_to_expiry < 0.0 {
        return Err(StrategyError::invalid(
            "time_to_expiry",
            "must be non-negative",
        ));
    }
    if !input.risk_free_rate.is_finite() {
        return Err(StrategyError::invalid(
            "risk_free_rate",
            "must be a finite number",
        ));
    }
    if !input.dividend_yield.is_finite() {
        return Err(StrategyError::invalid(
            "dividend_yield",
            "must be a finite number",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Black-Scholes internals
// ---------------------------------------------------------------------------

struct BsParams {
    d1: f64,
    d2: f64,
    sqrt_t: f64,
    exp_neg_qt: f64,
    exp_neg_rt: f64,
}

/// `None` when sigma * sqrt(t) is zero: the terminal price is then deterministic
/// and d1/d2 are undefined.
fn compute_bs_params(input: &OptionInput) -> Option<BsParams> {
    let t = input.time_to_expiry;
    let sigma = input.volatility;
    let sqrt_t = t.sqrt();
    let sigma_sqrt_t = sigma * sqrt_t;
    if sigma_sqrt_t <= 0.0 {
        return None;
    }
    let s = input.spot_price;
    let k = input.strike_price;
    let r = input.risk_free_rate;
    let q = input.dividend_yield;
    let d1 = ((s / k).ln() + (r - q + 0.5 * sigma * sigma) * t) / sigma_sqrt_t;
    Some(BsParams {
        d1,
        d2: d1 - sigma_sqrt_t,
        sqrt_t,
        exp_neg_qt: (-q * t).exp(),
        exp_neg_rt: (-r * t).exp(),
    })
}

pub(crate) fn intrinsic_value(s: Price, k: Price, option_type: OptionType) -> Price {
    match option_type {
        OptionType::Call => (s - k).max(0.0),
        OptionType::Put => (k - s).max(0.0),
    }
}

/// Value of the option when the terminal price is known with certainty:
/// the discounted payoff on the forward. Reduces to intrinsic value at t = 0.
fn deterministic_value(input: &OptionInput) -> Price {
    let t = input.time_to_expiry;
    let discounted_spot = input.spot_price * (-input.dividend_yield * t).exp();
    let discounted_strike = input.strike_price * (-input.risk_free_rate * t).exp();
    intrinsic_value(discounted_spot, discounted_strike, input.option_type)
}

/// Black-Scholes value without input validation. Callers guarantee
/// positive spot and strike and non-negative volatility and time.
pub(crate) fn value_unchecked(input: &OptionInput) -> Price {
    let Some(p) = compute_bs_params(input) else {
        return deterministic_value(input);
    };
    let s = input.spot_price;
    let k = input.strike_price;
    match input.option_type {
        OptionType::Call => s * p.exp_neg_qt * norm_cdf(p.d1) - k * p.exp_neg_rt * norm_cdf(p.d2),
        OptionType::Put => k * p.exp_neg_rt * norm_cdf(-p.d2) - s * p.exp_neg_qt * norm_cdf(-p.d1),
    }
}

fn greeks_unchecked(input: &OptionInput) -> OptionGreeks {
    let s = input.spot_price;
    let k = input.strike_price;
    let t = input.time_to_expiry;
    let r = input.risk_free_rate;
    let q = input.dividend_yield;

    let Some(p) = compute_bs_params(input) else {
        // Deterministic terminal price: only the discounted legs of the
        // forward payoff carry sensitivity.
        let exp_neg_qt = (-q * t).exp();
        let exp_neg_rt = (-r * t).exp();
        let fwd_spot = s * exp_neg_qt;
        let fwd_strike = k * exp_neg_rt;
        let exercised = match input.option_type {
            OptionType::Call => fwd_spot > fwd_strike,
            OptionType::Put => fwd_spot < fwd_strike,
        };
        if !exercised {
            return OptionGreeks::default();
        }
        let sign = match input.option_type {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        };
        return OptionGreeks {
            delta: sign * exp_neg_qt,
            gamma: 0.0,
            theta: sign * (q * fwd_spot - r * fwd_strike) / 365.0,
            vega: 0.0,
            rho: sign * k * t * exp_neg_rt / 100.0,
        };
    };

    let nd1 = norm_pdf(p.d1);
    let sigma_sqrt_t = p.d1 - p.d2;

    let delta = match input.option_type {
        OptionType::Call => p.exp_neg_qt * norm_cdf(p.d1),
        OptionType::Put => -p.exp_neg_qt * norm_cdf(-p.d1),
    };

    let gamma = p.exp_neg_qt * nd1 / (s * sigma_sqrt_t);

    let theta_annual = match input.option_type {
        OptionType::Call => {
            -s * p.exp_neg_qt * nd1 * sigma_sqrt_t / (2.0 * t)
                - r * k * p.exp_neg_rt * norm_cdf(p.d2)
                + q * s * p.exp_neg_qt * norm_cdf(p.d1)
        }
        OptionType::Put => {
            -s * p.exp_neg_qt * nd1 * sigma_sqrt_t / (2.0 * t)
                + r * k * p.exp_neg_rt * norm_cdf(-p.d2)
                - q * s * p.exp_neg_qt * norm_cdf(-p.d1)
        }
    };

    let vega = s * p.exp_neg_qt * nd1 * p.sqrt_t / 100.0;

    let rho = match input.option_type {
        OptionType::Call => k * t * p.exp_neg_rt * norm_cdf(p.d2) / 100.0,
        OptionType::Put => -k * t * p.exp_neg_rt * norm_cdf(-p.d2) / 100.0,
    };

    OptionGreeks {
        delta,
        gamma,
        theta: theta_annual / 365.0,
        vega,
        rho,
    }
}

fn itm_probability_unchecked(input: &OptionInput) -> f64 {
    match compute_bs_params(input) {
        Some(p) => match input.option_type {
            OptionType::Call => norm_cdf(p.d2),
            OptionType::Put => norm_cdf(-p.d2),
        },
        None => {
            let t = input.time_to_expiry;
            let forward =
                input.spot_price * ((input.risk_free_rate - input.dividend_yield) * t).exp();
            let itm = match input.option_type {
                OptionType::Call => forward > input.strike_price,
                OptionType::Put => forward < input.strike_price,
            };
            if itm {
                1.0
            } else {
                0.0
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Black-Scholes value of a European option.
///
/// Zero time or zero volatility is valid and collapses to the discounted
/// payoff on the forward (plain intrinsic value when `time_to_expiry == 0`).
pub fn price(input: &OptionInput) -> StrategyResult<Price> {
    validate_pricing_input(input)?;
    Ok(value_unchecked(input))
}

pub fn greeks(input: &OptionInput) -> StrategyResult<OptionGreeks> {
    validate_pricing_input(input)?;
    Ok(greeks_unchecked(input))
}

/// Risk-neutral probability that the option finishes in the money.
pub fn itm_probability(input: &OptionInput) -> StrategyResult<f64> {
    validate_pricing_input(input)?;
    Ok(itm_probability_unchecked(input))
}

/// Price, greeks and moneyness in one pass.
pub fn value_option(input: &OptionInput) -> StrategyResult<OptionValuation> {
    validate_pricing_input(input)?;
    let price = value_unchecked(input);
    let intrinsic = intrinsic_value(input.spot_price, input.strike_price, input.option_type);
    Ok(OptionValuation {
        price,
        intrinsic_value: intrinsic,
        time_value: price - intrinsic,
        greeks: greeks_unchecked(input),
        itm_probability: itm_probability_unchecked(input),
    })
}

// ---------------------------------------------------------------------------
// Terminal price distribution
// ---------------------------------------------------------------------------

/// Distribution of the underlying at a horizon under the Black-Scholes
/// dynamics: ln S_T ~ N(ln S + (r - q - sigma^2 / 2) t, sigma^2 t).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminalDistribution {
    LogNormal { forward: Price, dist: LogNormal },
    /// sigma^2 t == 0: the terminal price is the forward, with certainty.
    PointMass(Price),
}

impl TerminalDistribution {
    pub fn new(
        spot: Price,
        volatility: Rate,
        rate: Rate,
        dividend_yield: Rate,
        horizon: Years,
    ) -> StrategyResult<Self> {
        if !spot.is_finite() || spot <= 0.0 {
            return Err(StrategyError::invalid("stock_price", "must be positive"));
        }
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(StrategyError::invalid("volatility", "must be non-negative"));
        }
        let forward = spot * ((rate - dividend_yield) * horizon).exp();
        let scale = volatility * horizon.max(0.0).sqrt();
        if scale <= 0.0 {
            return Ok(TerminalDistribution::PointMass(forward));
        }
        let location = spot.ln() + (rate - dividend_yield - 0.5 * volatility * volatility) * horizon;
        let dist = LogNormal::new(location, scale)
            .map_err(|e| StrategyError::invalid("volatility", e.to_string()))?;
        Ok(TerminalDistribution::LogNormal { forward, dist })
    }

    /// Expected terminal price.
    pub fn forward(&self) -> Price {
        match self {
            TerminalDistribution::LogNormal { forward, .. } => *forward,
            TerminalDistribution::PointMass(x) => *x,
        }
    }

    pub fn cdf(&self, x: Price) -> f64 {
        match self {
            TerminalDistribution::LogNormal { dist, .. } => {
                if x <= 0.0 {
                    0.0
                } else {
                    dist.cdf(x)
                }
            }
            TerminalDistribution::PointMass(m) => {
                if x >= *m {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
