use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StrategyError;
use crate::types::*;
use crate::StrategyResult;

pub const DEFAULT_DAYS_IN_YEAR: u32 = 365;

fn default_days_in_year() -> u32 {
    DEFAULT_DAYS_IN_YEAR
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Unvalidated market parameters, as supplied by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInput {
    pub stock_price: Price,
    pub volatility: Rate,
    #[serde(default)]
    pub interest_rate: Rate,
    #[serde(default)]
    pub dividend_yield: Rate,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
    pub min_stock: Price,
    pub max_stock: Price,
    #[serde(default = "default_days_in_year")]
    pub days_in_year: u32,
}

/// Validated, immutable market parameters for one evaluation.
///
/// Only obtainable through [`MarketParameters::new`] (or deserialization, which
/// runs the same checks), so every instance satisfies
/// `0 <= min_stock < stock_price < max_stock`, `volatility >= 0` and
/// `target_date >= start_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MarketInput", into = "MarketInput")]
pub struct MarketParameters {
    stock_price: Price,
    volatility: Rate,
    interest_rate: Rate,
    dividend_yield: Rate,
    start_date: NaiveDate,
    target_date: NaiveDate,
    min_stock: Price,
    max_stock: Price,
    days_in_year: u32,
}

impl MarketParameters {
    pub fn new(input: MarketInput) -> StrategyResult<Self> {
        validate_market_input(&input)?;
        Ok(MarketParameters {
            stock_price: input.stock_price,
            volatility: input.volatility,
            interest_rate: input.interest_rate,
            dividend_yield: input.dividend_yield,
            start_date: input.start_date,
            target_date: input.target_date,
            min_stock: input.min_stock,
            max_stock: input.max_stock,
            days_in_year: input.days_in_year,
        })
    }

    pub fn stock_price(&self) -> Price {
        self.stock_price
    }

    pub fn volatility(&self) -> Rate {
        self.volatility
    }

    pub fn interest_rate(&self) -> Rate {
        self.interest_rate
    }

    pub fn dividend_yield(&self) -> Rate {
        self.dividend_yield
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    pub fn min_stock(&self) -> Price {
        self.min_stock
    }

    pub fn max_stock(&self) -> Price {
        self.max_stock
    }

    pub fn days_in_year(&self) -> u32 {
        self.days_in_year
    }

    /// Calendar days between `from` and `to`, as a year fraction. Never negative.
    pub fn years_between(&self, from: NaiveDate, to: NaiveDate) -> Years {
        let days = (to - from).num_days().max(0);
        days as f64 / self.days_in_year as f64
    }

    /// Time from the valuation date to the target date.
    pub fn time_to_target(&self) -> Years {
        self.years_between(self.start_date, self.target_date)
    }
}

impl TryFrom<MarketInput> for MarketParameters {
    type Error = StrategyError;

    fn try_from(input: MarketInput) -> Result<Self, Self::Error> {
        MarketParameters::new(input)
    }
}

impl From<MarketParameters> for MarketInput {
    fn from(m: MarketParameters) -> Self {
        MarketInput {
            stock_price: m.stock_price,
            volatility: m.volatility,
            interest_rate: m.interest_rate,
            dividend_yield: m.dividend_yield,
            start_date: m.start_date,
            target_date: m.target_date,
            min_stock: m.min_stock,
            max_stock: m.max_stock,
            days_in_year: m.days_in_year,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_market_input(input: &MarketInput) -> StrategyResult<()> {
    if !input.stock_price.is_finite() || input.stock_price <= 0.0 {
        return Err(StrategyError::invalid("stock_price", "must be positive"));
    }
    if !input.volatility.is_finite() || input.volatility < 0.0 {
        return Err(StrategyError::invalid("volatility", "must be non-negative"));
    }
    if !input.interest_rate.is_finite() {
        return Err(StrategyError::invalid("interest_rate", "must be a finite number"));
    }
    if !input.dividend_yield.is_finite() || input.dividend_yield < 0.0 {
        return Err(StrategyError::invalid("dividend_yield", "must be non-negative"));
    }
    if input.target_date < input.start_date {
        return Err(StrategyError::invalid(
            "target_date",
            format!(
                "must not be earlier than start_date ({})",
                input.start_date
            ),
        ));
    }
    if input.days_in_year == 0 {
        return Err(StrategyError::invalid("days_in_year", "must be positive"));
    }
    if !input.min_stock.is_finite() || input.min_stock < 0.0 {
        return Err(StrategyError::invalid("min_stock", "must be non-negative"));
    }
    if !input.max_stock.is_finite() {
        return Err(StrategyError::invalid("max_stock", "must be a finite number"));
    }
    if input.min_stock >= input.stock_price {
        return Err(StrategyError::invalid(
            "min_stock",
            "must be below stock_price",
        ));
    }
    if input.max_stock <= input.stock_price {
        return Err(StrategyError::invalid(
            "max_stock",
            "must be above stock_price",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
