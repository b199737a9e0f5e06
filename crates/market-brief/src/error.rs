//! Error types for market brief operations

use thiserror::Error;

/// Errors raised by providers, the news pipeline and configuration.
///
/// The provider-facing variants distinguish "no such symbol" from "try again
/// later" so the fetcher can decide between retrying, falling back and
/// emitting a zero sentinel.
#[derive(Debug, Error)]
pub enum BriefError {
    /// Provider refused the call because of its request ceiling
    #[error("Rate limit exceeded for {provider}")]
    RateLimited {
        provider: String,
    },

    /// Provider does not know the symbol
    #[error("Symbol not found: {symbol}")]
    NotFound {
        symbol: String,
    },

    /// Provider answered but the data is missing or incomplete
    #[error("Data not available for {symbol}: {reason}")]
    Unavailable {
        symbol: String,
        reason: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    Yahoo(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantage(String),

    /// Embedding or similarity index failure
    #[error("Index error: {0}")]
    Index(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl BriefError {
    /// Whether the failure is a transient rate limit worth retrying.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub(crate) fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for market brief operations
pub type Result<T> = std::result::Result<T, BriefError>;

impl From<anyhow::Error> for BriefError {
    fn from(err: anyhow::Error) -> Self {
        BriefError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BriefError::NotFound {
            symbol: "ZZZZ".to_string(),
        };
        assert_eq!(err.to_string(), "Symbol not found: ZZZZ");

        let err = BriefError::unavailable("TSM", "empty price series");
        assert_eq!(err.to_string(), "Data not available for TSM: empty price series");
    }

    #[test]
    fn test_rate_limit_detection() {
        let limited = BriefError::RateLimited {
            provider: "Alpha Vantage".to_string(),
        };
        assert!(limited.is_rate_limited());
        assert!(!BriefError::AlphaVantage("boom".to_string()).is_rate_limited());
        assert!(!BriefError::unavailable("TSM", "no data").is_rate_limited());
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: BriefError = anyhow::anyhow!("wrapped failure").into();
        assert!(matches!(err, BriefError::Other(msg) if msg == "wrapped failure"));
    }
}
