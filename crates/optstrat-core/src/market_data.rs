//! Collaborator boundary for quotes and options chains.
//!
//! Providers are traits so the engine never depends on a particular feed.
//! Raw provider payloads are loosely typed; the coercion helpers here turn
//! missing or non-numeric fields into documented defaults. They are only for
//! external data and are never used by the pricing or probability code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::StrategyError;
use crate::types::*;
use crate::StrategyResult;

/// Trading days per year used to annualize daily return volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Volatility reported when the history is too short to estimate one.
pub const DEFAULT_VOLATILITY: f64 = 0.25;

/// Number of expirations kept from a chain, nearest first.
pub const MAX_EXPIRATIONS: usize = 6;

/// Spot used for a chain when the provider reports none.
pub const DEFAULT_CHAIN_PRICE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub ticker: String,
    pub company_name: String,
    pub current_price: Price,
    /// Annualized historical volatility
    pub volatility: Rate,
    pub currency: String,
    pub market_cap: Option<f64>,
    pub sector: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: Price,
    pub last_price: Price,
    pub bid: Price,
    pub ask: Price,
    pub volume: u64,
    pub open_interest: u64,
    pub implied_volatility: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpirationChain {
    pub expiration: NaiveDate,
    pub calls: Vec<OptionQuote>,
    pub puts: Vec<OptionQuote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsChain {
    pub ticker: String,
    pub current_price: Price,
    pub expirations: Vec<ExpirationChain>,
}

/// Source of spot price and historical volatility.
pub trait MarketDataProvider {
    fn quote(&self, ticker: &str) -> StrategyResult<StockQuote>;
}

/// Source of listed option quotes.
pub trait OptionsChainProvider {
    fn chain(&self, ticker: &str) -> StrategyResult<OptionsChain>;
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

/// Numeric value of a raw field; `None`, null, "nan", "none", "" and anything
/// unparseable become `default`.
pub fn coerce_f64(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("none") {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|x| x.is_finite()).unwrap_or(default)
}

/// Integer value of a raw field, truncating fractional counts. Negative or
/// missing values become `default`.
pub fn coerce_u64(value: Option<&Value>, default: u64) -> u64 {
    let x = coerce_f64(value, f64::NAN);
    if x.is_finite() && x >= 0.0 {
        x.trunc() as u64
    } else {
        default
    }
}

fn coerce_string(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Build an [`OptionQuote`] from a raw chain row (camelCase provider fields).
pub fn option_quote_from_row(row: &Value) -> OptionQuote {
    OptionQuote {
        strike: coerce_f64(row.get("strike"), 0.0),
        last_price: coerce_f64(row.get("lastPrice"), 0.0),
        bid: coerce_f64(row.get("bid"), 0.0),
        ask: coerce_f64(row.get("ask"), 0.0),
        volume: coerce_u64(row.get("volume"), 0),
        open_interest: coerce_u64(row.get("openInterest"), 0),
        implied_volatility: coerce_f64(row.get("impliedVolatility"), 0.0),
    }
}

// ---------------------------------------------------------------------------
// Historical volatility
// ---------------------------------------------------------------------------

/// Annualized volatility of daily close-to-close simple returns.
///
/// Uses the sample standard deviation scaled by sqrt(252). Returns `None`
/// with fewer than two closes, and [`DEFAULT_VOLATILITY`] when there are
/// fewer than two returns to estimate from.
pub fn historical_volatility(closes: &[f64]) -> Option<f64> {
    if closes.len() < 2 {
        return None;
    }
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0 && w[0].is_finite() && w[1].is_finite())
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return Some(DEFAULT_VOLATILITY);
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

// ---------------------------------------------------------------------------
// Snapshot documents
// ---------------------------------------------------------------------------

/// Build a quote from a provider snapshot:
/// `{ "info": {longName, currency, marketCap, sector}, "history": [closes] }`.
pub fn quote_from_snapshot(ticker: &str, snapshot: &Value) -> StrategyResult<StockQuote> {
    let ticker = ticker.trim().to_ascii_uppercase();
    let closes: Vec<f64> = snapshot
        .get("history")
        .and_then(Value::as_array)
        .map(|h| h.iter().map(|v| coerce_f64(Some(v), f64::NAN)).filter(|x| x.is_finite()).collect())
        .unwrap_or_default();

    let (Some(&last), Some(volatility)) = (closes.last(), historical_volatility(&closes)) else {
        return Err(StrategyError::unavailable(
            "market data",
            format!("No data found for ticker {}", ticker),
        ));
    };

    let info = snapshot.get("info").cloned().unwrap_or(Value::Null);
    let market_cap = info
        .get("marketCap")
        .map(|v| coerce_f64(Some(v), f64::NAN))
        .and_then(finite);

    Ok(StockQuote {
        company_name: coerce_string(info.get("longName"), &ticker),
        current_price: round_cents(last),
        volatility: round_to(volatility, 4),
        currency: coerce_string(info.get("currency"), "USD"),
        market_cap,
        sector: coerce_string(info.get("sector"), "Unknown"),
        ticker,
    })
}

/// Build an options chain from a provider snapshot:
/// `{ "info": {currentPrice | regularMarketPrice}, "options": [{expiration, calls, puts}] }`.
///
/// Only the first [`MAX_EXPIRATIONS`] expirations are read. An expiration
/// whose date does not parse is skipped with a warning.
pub fn chain_from_snapshot(ticker: &str, snapshot: &Value) -> StrategyResult<OptionsChain> {
    let ticker = ticker.trim().to_ascii_uppercase();
    let raw = snapshot
        .get("options")
        .and_then(Value::as_array)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            StrategyError::unavailable(
                "options chain",
                format!("No options data found for ticker {}", ticker),
            )
        })?;

    let info = snapshot.get("info").cloned().unwrap_or(Value::Null);
    let current = info
        .get("currentPrice")
        .map(|v| coerce_f64(Some(v), 0.0))
        .filter(|p| *p > 0.0)
        .unwrap_or_else(|| coerce_f64(info.get("regularMarketPrice"), DEFAULT_CHAIN_PRICE));

    let rows = |v: Option<&Value>| -> Vec<OptionQuote> {
        v.and_then(Value::as_array)
            .map(|rows| rows.iter().map(option_quote_from_row).collect())
            .unwrap_or_default()
    };

    let mut expirations = Vec::with_capacity(MAX_EXPIRATIONS);
    for entry in raw.iter().take(MAX_EXPIRATIONS) {
        let date = entry
            .get("expiration")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
        let Some(expiration) = date else {
            let bad_date = entry.get("expiration").cloned().unwrap_or(Value::Null);
            warn!(ticker = %ticker, expiration = %bad_date, "skipping expiration with unparseable date");
            continue;
        };
        expirations.push(ExpirationChain {
            expiration,
            calls: rows(entry.get("calls")),
            puts: rows(entry.get("puts")),
        });
    }

    if expirations.is_empty() {
        return Err(StrategyError::unavailable(
            "options chain",
            format!("No usable expirations for ticker {}", ticker),
        ));
    }

    Ok(OptionsChain {
        ticker,
        current_price: round_cents(current),
        expirations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_coerce_defaults() {
        assert_eq!(coerce_f64(None, 0.0), 0.0);
        assert_eq!(coerce_f64(Some(&Value::Null), 0.0), 0.0);
        assert_eq!(coerce_f64(Some(&json!("NaN")), 0.0), 0.0);
        assert_eq!(coerce_f64(Some(&json!("none")), 0.0), 0.0);
        assert_eq!(coerce_f64(Some(&json!("")), 0.0), 0.0);
        assert_eq!(coerce_f64(Some(&json!("abc")), 0.0), 0.0);
        assert_eq!(coerce_f64(Some(&json!("1.25")), 0.0), 1.25);
        assert_eq!(coerce_f64(Some(&json!(3)), 0.0), 3.0);
        assert_eq!(coerce_u64(Some(&json!(12.9)), 0), 12);
        assert_eq!(coerce_u64(Some(&json!("nan")), 0), 0);
    }

    #[test]
    fn test_option_row_coercion() {
        let row = json!({
            "strike": 105, "lastPrice": "2.1", "bid": null, "ask": "NaN",
            "volume": "17", "openInterest": null, "impliedVolatility": 0.31
        });
        assert_eq!(
            option_quote_from_row(&row),
            OptionQuote {
                strike: 105.0,
                last_price: 2.1,
                bid: 0.0,
                ask: 0.0,
                volume: 17,
                open_interest: 0,
                implied_volatility: 0.31,
            }
        );
    }

    #[test]
    fn test_historical_volatility() {
        assert_eq!(historical_volatility(&[100.0]), None);
        assert_eq!(historical_volatility(&[100.0, 101.0]), Some(DEFAULT_VOLATILITY));
        // Constant growth: zero dispersion
        let closes = [100.0, 101.0, 102.01, 103.0301];
        assert!(historical_volatility(&closes).unwrap() < 1e-9);
        let v = historical_volatility(&[100.0, 102.0, 99.0, 101.0, 100.0]).unwrap();
        assert!(v > 0.2 && v < 0.5, "vol = {}", v);
    }

    #[test]
    fn test_quote_from_snapshot() {
        let snap = json!({
            "info": {"longName": "Acme Corp", "marketCap": 1.5e9, "sector": "Industrials"},
            "history": [100.0, 102.0, 99.0, 101.0, 100.456]
        });
        let q = quote_from_snapshot("acme", &snap).unwrap();
        assert_eq!(q.ticker, "ACME");
        assert_eq!(q.company_name, "Acme Corp");
        assert_eq!(q.current_price, 100.46);
        assert_eq!(q.currency, "USD");
        assert_eq!(q.market_cap, Some(1.5e9));
    }

    #[test]
    fn test_quote_without_history_unavailable() {
        let err = quote_from_snapshot("zzz", &json!({"history": [10.0]})).unwrap_err();
        assert!(matches!(err, StrategyError::UpstreamDataUnavailable { .. }));
    }

    #[test]
    fn test_chain_skips_bad_expirations_and_limits() {
        let mut options: Vec<Value> = (1..=8)
            .map(|d| json!({"expiration": format!("2026-07-{:02}", d), "calls": [{"strike": 100}], "puts": []}))
            .collect();
        options[1] = json!({"expiration": "soon", "calls": [], "puts": []});
        let snap = json!({"info": {"regularMarketPrice": 101.234}, "options": options});
        let chain = chain_from_snapshot("acme", &snap).unwrap();
        assert_eq!(chain.current_price, 101.23);
        // Six read, one skipped
        assert_eq!(chain.expirations.len(), 5);
        assert_eq!(chain.expirations[0].calls[0].strike, 100.0);
    }

    #[test]
    fn test_chain_with_only_bad_dates_unavailable() {
        let snap = json!({"options": [{"expiration": "soon", "calls": [], "puts": []}]});
        let err = chain_from_snapshot("acme", &snap).unwrap_err();
        assert!(matches!(err, StrategyError::UpstreamDataUnavailable { .. }));
    }

    #[test]
    fn test_empty_chain_unavailable() {
        let err = chain_from_snapshot("acme", &json!({"options": []})).unwrap_err();
        assert!(matches!(err, StrategyError::UpstreamDataUnavailable { .. }));
    }
}
