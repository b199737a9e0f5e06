//! Ticker extraction from free-text queries

use crate::api::MarketDataSource;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Uppercase letters, optional trailing digits, optional exchange suffix (`.KS`)
static TICKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z]{1,5}[0-9]{0,2}(?:\.[A-Z]{1,3})?\b").expect("valid ticker pattern")
});

/// Extracts and validates ticker symbols
#[derive(Debug, Clone)]
pub struct SymbolExtractor {
    default_symbol: String,
}

impl SymbolExtractor {
    pub fn new(default_symbol: impl Into<String>) -> Self {
        Self {
            default_symbol: default_symbol.into().to_uppercase(),
        }
    }

    pub fn default_symbol(&self) -> &str {
        &self.default_symbol
    }

    /// Ticker-shaped tokens in `query`, deduplicated
    pub fn candidates(&self, query: &str) -> BTreeSet<String> {
        TICKER_PATTERN
            .find_iter(query)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Keep the candidates the provider recognises; fall back to the default
    /// symbol when none survive
    pub async fn validate_candidates(
        &self,
        candidates: BTreeSet<String>,
        source: &dyn MarketDataSource,
    ) -> Vec<String> {
        let mut valid = Vec::with_capacity(candidates.len());

        for symbol in candidates {
            match source.validate(&symbol).await {
                Ok(true) => valid.push(symbol),
                Ok(false) => info!(symbol = %symbol, "rejected symbol: not recognised by provider"),
                Err(e) => warn!(symbol = %symbol, error = %e, "rejected symbol: validation failed"),
            }
        }

        if valid.is_empty() {
            debug!(default = %self.default_symbol, "no valid symbols, using default");
            return vec![self.default_symbol.clone()];
        }

        valid
    }

    /// Candidates from `query` checked against `source`
    pub async fn extract(&self, query: &str, source: &dyn MarketDataSource) -> Vec<String> {
        let candidates = self.candidates(query);
        debug!(?candidates, "ticker candidates");
        self.validate_candidates(candidates, source).await
    }
}
