use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Unsupported leg type at strategy[{index}]: '{tag}' (expected stock, call or put)")]
    UnsupportedLegType { index: usize, tag: String },

    #[error("Upstream data unavailable from {provider}: {reason}")]
    UpstreamDataUnavailable { provider: String, reason: String },

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl StrategyError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        StrategyError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        StrategyError::UpstreamDataUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending input field, when the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            StrategyError::InvalidParameter { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StrategyError {
    fn from(e: serde_json::Error) -> Self {
        StrategyError::SerializationError(e.to_string())
    }
}
