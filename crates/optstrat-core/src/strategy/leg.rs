use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StrategyError;
use crate::market::MarketParameters;
use crate::types::*;
use crate::StrategyResult;

// ---------------------------------------------------------------------------
// Leg types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLeg {
    pub n: u32,
    pub action: Action,
    /// Entry price of a position already held. Defaults to the spot price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_pos: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub strike: Price,
    pub premium: Price,
    pub n: u32,
    pub action: Action,
    /// Expiration of the contract. Defaults to the target date, meaning the
    /// leg is held to expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<NaiveDate>,
}

/// One position in a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StrategyLeg {
    Stock(StockLeg),
    Call(OptionLeg),
    Put(OptionLeg),
}

impl StrategyLeg {
    pub fn call(strike: Price, premium: Price, n: u32, action: Action) -> Self {
        StrategyLeg::Call(OptionLeg {
            strike,
            premium,
            n,
            action,
            expiration: None,
        })
    }

    pub fn put(strike: Price, premium: Price, n: u32, action: Action) -> Self {
        StrategyLeg::Put(OptionLeg {
            strike,
            premium,
            n,
            action,
            expiration: None,
        })
    }

    pub fn stock(n: u32, action: Action) -> Self {
        StrategyLeg::Stock(StockLeg {
            n,
            action,
            prev_pos: None,
        })
    }

    pub fn action(&self) -> Action {
        match self {
            StrategyLeg::Stock(s) => s.action,
            StrategyLeg::Call(o) | StrategyLeg::Put(o) => o.action,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            StrategyLeg::Stock(s) => s.n,
            StrategyLeg::Call(o) | StrategyLeg::Put(o) => o.n,
        }
    }

    /// Signed exposure: +n for buys, -n for sells.
    pub fn multiplier(&self) -> f64 {
        self.action().sign() * self.quantity() as f64
    }

    pub fn option_type(&self) -> Option<OptionType> {
        match self {
            StrategyLeg::Stock(_) => None,
            StrategyLeg::Call(_) => Some(OptionType::Call),
            StrategyLeg::Put(_) => Some(OptionType::Put),
        }
    }

    pub fn strike(&self) -> Option<Price> {
        match self {
            StrategyLeg::Stock(_) => None,
            StrategyLeg::Call(o) | StrategyLeg::Put(o) => Some(o.strike),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            StrategyLeg::Stock(_) => "stock",
            StrategyLeg::Call(_) => "call",
            StrategyLeg::Put(_) => "put",
        }
    }

    /// Validate the leg at position `index` against the market it will be
    /// evaluated in. Field names in errors are indexed, e.g. `strategy[2].strike`.
    pub fn validate(&self, index: usize, market: &MarketParameters) -> StrategyResult<()> {
        let field = |name: &str| format!("strategy[{}].{}", index, name);

        if self.quantity() == 0 {
            return Err(StrategyError::invalid(field("n"), "must be positive"));
        }

        match self {
            StrategyLeg::Stock(s) => {
                if let Some(prev) = s.prev_pos {
                    if !prev.is_finite() || prev <= 0.0 {
                        return Err(StrategyError::invalid(
                            field("prev_pos"),
                            "must be positive",
                        ));
                    }
                }
            }
            StrategyLeg::Call(o) | StrategyLeg::Put(o) => {
                if !o.strike.is_finite() || o.strike <= 0.0 {
                    return Err(StrategyError::invalid(field("strike"), "must be positive"));
                }
                if !o.premium.is_finite() || o.premium < 0.0 {
                    return Err(StrategyError::invalid(
                        field("premium"),
                        "must be non-negative",
                    ));
                }
                if let Some(exp) = o.expiration {
                    if exp < market.target_date() {
                        return Err(StrategyError::invalid(
                            field("expiration"),
                            format!(
                                "must not be earlier than target_date ({})",
                                market.target_date()
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
