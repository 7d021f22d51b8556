use serde::{Deserialize, Serialize};

/// Underlying and option prices, per share.
pub type Price = f64;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = f64;

/// Year fractions
pub type Years = f64;

/// Direction of a position. Quantity is always positive; the action carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    pub fn sign(self) -> f64 {
        match self {
            Action::Buy => 1.0,
            Action::Sell => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}

/// `Some(x)` for finite values, `None` for NaN and infinities.
pub fn finite(x: f64) -> Option<f64> {
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

/// Round half away from zero to `dp` decimal places.
pub fn round_to(x: f64, dp: i32) -> f64 {
    let f = 10f64.powi(dp);
    (x * f).round() / f
}

/// Round to cents, as prices and strikes are quoted.
pub fn round_cents(x: f64) -> f64 {
    round_to(x, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_sign() {
        assert_eq!(Action::Buy.sign(), 1.0);
        assert_eq!(Action::Sell.sign(), -1.0);
    }

    #[test]
    fn test_action_serde_lowercase() {
        let a: Action = serde_json::from_str("\"sell\"").unwrap();
        assert_eq!(a, Action::Sell);
        assert_eq!(serde_json::to_string(&OptionType::Put).unwrap(), "\"put\"");
    }

    #[test]
    fn test_finite_filters_non_finite() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(0.0), Some(0.0));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::INFINITY), None);
        assert_eq!(finite(f64::NEG_INFINITY), None);
    }

    #[test]
    fn test_metadata_populated() {
        let out = with_metadata("m", &serde_json::json!({"a": 1}), vec![], 7, 3u8);
        assert_eq!(out.metadata.precision, "ieee754_f64");
        assert_eq!(out.metadata.computation_time_us, 7);
        assert_eq!(out.assumptions["a"], 1);
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round_cents(12.345_6), 12.35);
        assert_eq!(round_cents(-0.004), 0.0);
        assert_eq!(round_to(0.123_456, 4), 0.1235);
    }
}
