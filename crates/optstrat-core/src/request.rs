//! Boundary between loosely typed strategy requests and the typed core.
//!
//! Requests arrive as JSON objects whose numbers may be JSON numbers or
//! numeric strings and whose legs are untyped maps. Everything is parsed and
//! validated here; the core only ever sees [`MarketParameters`] and
//! [`StrategyLeg`] values.

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;

use crate::error::StrategyError;
use crate::market::{MarketInput, MarketParameters, DEFAULT_DAYS_IN_YEAR};
use crate::strategy::{self, EvaluationConfig, OptionLeg, RiskMetrics, StockLeg, StrategyLeg};
use crate::types::*;
use crate::StrategyResult;

/// Half-width of the price domain as a fraction of spot when no explicit
/// bounds are given.
pub const DEFAULT_PRICE_RANGE: f64 = 0.5;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Parsed request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub ticker: Option<String>,
    pub market: MarketParameters,
    pub legs: Vec<StrategyLeg>,
    pub config: EvaluationConfig,
}

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn required_number(obj: &Map<String, Value>, key: &str, field: &str) -> StrategyResult<f64> {
    let raw = obj.get(key);
    if is_absent(raw) {
        return Err(StrategyError::invalid(field, "is required"));
    }
    raw.and_then(as_number)
        .filter(|x| x.is_finite())
        .ok_or_else(|| StrategyError::invalid(field, "must be a number"))
}

fn optional_number(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> StrategyResult<Option<f64>> {
    let raw = obj.get(key);
    if is_absent(raw) {
        return Ok(None);
    }
    raw.and_then(as_number)
        .filter(|x| x.is_finite())
        .map(Some)
        .ok_or_else(|| StrategyError::invalid(field, "must be a number"))
}

fn required_count(obj: &Map<String, Value>, key: &str, field: &str) -> StrategyResult<u32> {
    let n = required_number(obj, key, field)?;
    if n.fract() != 0.0 {
        return Err(StrategyError::invalid(field, "must be a whole number"));
    }
    if n <= 0.0 {
        return Err(StrategyError::invalid(field, "must be positive"));
    }
    if n > u32::MAX as f64 {
        return Err(StrategyError::invalid(field, "is too large"));
    }
    Ok(n as u32)
}

fn parse_date(obj: &Map<String, Value>, key: &str, field: &str) -> StrategyResult<NaiveDate> {
    match obj.get(key) {
        Some(Value::String(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|_| StrategyError::invalid(field, "expected a date as YYYY-MM-DD")),
        None | Some(Value::Null) => Err(StrategyError::invalid(field, "is required")),
        Some(_) => Err(StrategyError::invalid(field, "expected a date as YYYY-MM-DD")),
    }
}

fn optional_date(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> StrategyResult<Option<NaiveDate>> {
    if is_absent(obj.get(key)) {
        return Ok(None);
    }
    parse_date(obj, key, field).map(Some)
}

fn parse_action(obj: &Map<String, Value>, field: &str) -> StrategyResult<Action> {
    match obj.get("action").and_then(Value::as_str) {
        Some(s) if s.eq_ignore_ascii_case("buy") => Ok(Action::Buy),
        Some(s) if s.eq_ignore_ascii_case("sell") => Ok(Action::Sell),
        Some(_) => Err(StrategyError::invalid(field, "must be 'buy' or 'sell'")),
        None => Err(StrategyError::invalid(field, "is required")),
    }
}

// ---------------------------------------------------------------------------
// Leg parsing
// ---------------------------------------------------------------------------

/// Parse one untyped leg object into a [`StrategyLeg`].
///
/// Structural problems (wrong JSON type, missing or malformed fields) are
/// reported here; range checks against the market happen in
/// [`StrategyLeg::validate`].
pub fn parse_leg(index: usize, value: &Value) -> StrategyResult<StrategyLeg> {
    let field = |name: &str| format!("strategy[{}].{}", index, name);

    let obj = value
        .as_object()
        .ok_or_else(|| StrategyError::invalid(format!("strategy[{}]", index), "must be an object"))?;

    let tag = match obj.get("type") {
        Some(Value::String(s)) => s.trim().to_ascii_lowercase(),
        None | Some(Value::Null) => return Err(StrategyError::invalid(field("type"), "is required")),
        Some(other) => {
            return Err(StrategyError::UnsupportedLegType {
                index,
                tag: other.to_string(),
            })
        }
    };
    if !matches!(tag.as_str(), "stock" | "call" | "put") {
        return Err(StrategyError::UnsupportedLegType { index, tag });
    }

    let action = parse_action(obj, &field("action"))?;
    let n = required_count(obj, "n", &field("n"))?;

    match tag.as_str() {
        "stock" => Ok(StrategyLeg::Stock(StockLeg {
            n,
            action,
            prev_pos: optional_number(obj, "prev_pos", &field("prev_pos"))?,
        })),
        "call" | "put" => {
            let leg = OptionLeg {
                strike: required_number(obj, "strike", &field("strike"))?,
                premium: required_number(obj, "premium", &field("premium"))?,
                n,
                action,
                expiration: optional_date(obj, "expiration", &field("expiration"))?,
            };
            Ok(if tag == "call" {
                StrategyLeg::Call(leg)
            } else {
                StrategyLeg::Put(leg)
            })
        }
        _ => Err(StrategyError::UnsupportedLegType { index, tag }),
    }
}

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

/// Parse and validate a strategy request.
///
/// The price domain comes from explicit `min_stock`/`max_stock` when both are
/// present, otherwise from `price_range` (default 0.5) as
/// `spot ∓ round(spot × price_range, 2)`.
pub fn parse_request(value: &Value) -> StrategyResult<ParsedRequest> {
    let obj = value
        .as_object()
        .ok_or_else(|| StrategyError::invalid("request", "must be a JSON object"))?;

    let ticker = obj
        .get("stock_ticker")
        .and_then(Value::as_str)
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty() && t != "UNKNOWN");

    let stock_price = required_number(obj, "stock_price", "stock_price")?;
    let volatility = required_number(obj, "volatility", "volatility")?;
    let interest_rate = optional_number(obj, "interest_rate", "interest_rate")?.unwrap_or(0.0);
    let dividend_yield = optional_number(obj, "dividend_yield", "dividend_yield")?.unwrap_or(0.0);
    let start_date = parse_date(obj, "start_date", "start_date")?;
    let target_date = parse_date(obj, "target_date", "target_date")?;

    let explicit_min = optional_number(obj, "min_stock", "min_stock")?;
    let explicit_max = optional_number(obj, "max_stock", "max_stock")?;
    let (min_stock, max_stock) = match (explicit_min, explicit_max) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => {
            let range =
                optional_number(obj, "price_range", "price_range")?.unwrap_or(DEFAULT_PRICE_RANGE);
            if range <= 0.0 {
                return Err(StrategyError::invalid("price_range", "must be positive"));
            }
            let half_width = round_cents(stock_price * range);
            (
                explicit_min.unwrap_or((stock_price - half_width).max(0.0)),
                explicit_max.unwrap_or(stock_price + half_width),
            )
        }
    };

    let days_in_year = match optional_number(obj, "days_in_year", "days_in_year")? {
        Some(d) if d.fract() != 0.0 || d <= 0.0 || d > 366.0 => {
            return Err(StrategyError::invalid(
                "days_in_year",
                "must be a whole number between 1 and 366",
            ))
        }
        Some(d) => d as u32,
        None => DEFAULT_DAYS_IN_YEAR,
    };

    let market = MarketParameters::new(MarketInput {
        stock_price,
        volatility,
        interest_rate,
        dividend_yield,
        start_date,
        target_date,
        min_stock,
        max_stock,
        days_in_year,
    })?;

    let raw_legs = match obj.get("strategy") {
        Some(Value::Array(items)) => items.as_slice(),
        None | Some(Value::Null) => &[],
        Some(_) => return Err(StrategyError::invalid("strategy", "must be a list of legs")),
    };
    let legs = raw_legs
        .iter()
        .enumerate()
        .map(|(i, v)| parse_leg(i, v))
        .collect::<StrategyResult<Vec<_>>>()?;
    for (i, leg) in legs.iter().enumerate() {
        leg.validate(i, &market)?;
    }

    let mut config = EvaluationConfig {
        profit_target: optional_number(obj, "profit_target", "profit_target")?,
        loss_limit: optional_number(obj, "loss_limit", "loss_limit")?,
        ..EvaluationConfig::default()
    };
    if let Some(points) = optional_number(obj, "grid_points", "grid_points")? {
        if points.fract() != 0.0 || points < 0.0 {
            return Err(StrategyError::invalid("grid_points", "must be a whole number"));
        }
        config.grid_points = points as usize;
    }

    Ok(ParsedRequest {
        ticker,
        market,
        legs,
        config,
    })
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Round to cents for presentation. Non-finite values become `None`; a
/// computed zero stays `Some(0)`.
pub fn round_metric(x: f64) -> Option<Decimal> {
    if !x.is_finite() {
        return None;
    }
    let d = Decimal::from_f64(x)?.round_dp(2);
    Some(if d.is_zero() { Decimal::ZERO } else { d })
}

fn round_ranges(ranges: &[(Price, Price)]) -> Vec<[Decimal; 2]> {
    ranges
        .iter()
        .filter_map(|&(lo, hi)| Some([round_metric(lo)?, round_metric(hi)?]))
        .collect()
}

fn percent(p: Option<f64>) -> Option<Decimal> {
    p.and_then(|p| round_metric(p * 100.0))
}

/// Presentation form of [`RiskMetrics`]: cents-rounded, probabilities in
/// percent, undefined metrics as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub probability_of_profit: Option<Decimal>,
    pub max_profit: Option<Decimal>,
    pub max_loss: Option<Decimal>,
    pub profit_ranges: Vec<[Decimal; 2]>,
    pub expected_profit: Option<Decimal>,
    pub expected_loss: Option<Decimal>,
    pub strategy_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_of_profit_target: Option<Decimal>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub profit_target_ranges: Vec<[Decimal; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_of_loss_limit: Option<Decimal>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub loss_limit_ranges: Vec<[Decimal; 2]>,
}

impl From<&RiskMetrics> for ReportMetrics {
    fn from(m: &RiskMetrics) -> Self {
        ReportMetrics {
            probability_of_profit: percent(m.probability_of_profit),
            max_profit: m.maximum_return_in_domain.and_then(round_metric),
            max_loss: m.minimum_return_in_domain.and_then(round_metric),
            profit_ranges: round_ranges(&m.profit_ranges),
            expected_profit: m.expected_profit.and_then(round_metric),
            expected_loss: m.expected_loss.and_then(round_metric),
            strategy_cost: round_metric(m.strategy_cost),
            probability_of_profit_target: percent(m.probability_of_profit_target),
            profit_target_ranges: round_ranges(&m.profit_target_ranges),
            probability_of_loss_limit: percent(m.probability_of_loss_limit),
            loss_limit_ranges: round_ranges(&m.loss_limit_ranges),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub title: String,
    pub metrics: ReportMetrics,
}

/// Parse, evaluate and format a request in one call.
pub fn analyze_request(value: &Value) -> StrategyResult<ComputationOutput<StrategyReport>> {
    let start = Instant::now();
    let parsed = parse_request(value)?;
    let evaluated = strategy::evaluate(&parsed.market, &parsed.legs, &parsed.config)?;

    let title = match &parsed.ticker {
        Some(t) => format!("{} Options Strategy Analysis", t),
        None => "Profit/Loss Diagram".to_string(),
    };
    let report = StrategyReport {
        success: true,
        ticker: parsed.ticker.clone(),
        title,
        metrics: ReportMetrics::from(&evaluated.result),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &evaluated.methodology,
        &evaluated.assumptions,
        evaluated.warnings,
        elapsed,
        report,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
