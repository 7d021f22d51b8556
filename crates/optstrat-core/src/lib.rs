pub mod error;
pub mod market;
pub mod pricing;
pub mod request;
pub mod strategy;
pub mod types;

#[cfg(feature = "presets")]
pub mod presets;

#[cfg(feature = "market_data")]
pub mod market_data;

#[cfg(feature = "chart")]
pub mod chart;

pub use error::StrategyError;
pub use market::{MarketInput, MarketParameters};
pub use strategy::{evaluate, evaluate_curve, EvaluationConfig, RiskMetrics, StrategyLeg};
pub use types::*;

/// Standard result type for all strategy-evaluation operations
pub type StrategyResult<T> = Result<T, StrategyError>;
