use thiserror::Error;

/// Failures inside the insight subsystem.
///
/// Only `ProviderFatal` ever reaches callers of the insight service; the
/// rest are recovered internally (next variant, synthetic fallback, or a
/// logged cache miss).
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("could not parse provider response: {0}")]
    ParseFailure(String),

    #[error("model variant {model} unavailable: {reason}")]
    ProviderUnavailable { model: String, reason: String },

    #[error("provider request failed: {0}")]
    ProviderFatal(String),

    #[error("insight cache i/o failed: {0}")]
    CacheIo(String),
}

impl From<serde_json::Error> for InsightError {
    fn from(e: serde_json::Error) -> Self {
        InsightError::ParseFailure(e.to_string())
    }
}

impl From<reqwest::Error> for InsightError {
    fn from(e: reqwest::Error) -> Self {
        InsightError::ProviderFatal(e.to_string())
    }
}
