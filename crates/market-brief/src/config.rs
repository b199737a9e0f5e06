//! Configuration for the market brief pipeline

use crate::error::{BriefError, Result};
use crate::model::PortfolioWeights;
use brief_utils::{env_flag, env_or, env_string};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder substituted with the symbol in [`BriefConfig::news_url_template`].
pub const SYMBOL_PLACEHOLDER: &str = "{symbol}";

/// Configuration for a [`crate::Orchestrator`] and the components it drives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefConfig {
    /// Symbol used when nothing in the query validates
    pub default_symbol: String,

    /// Maximum attempts against the secondary source on rate limits
    pub max_retries: u32,

    /// Base back-off; attempt `n` waits `base * 2^n`
    pub retry_backoff_base: Duration,

    /// Request ceiling of the secondary (Alpha Vantage) source
    pub secondary_requests_per_minute: u32,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Alpha Vantage API key
    pub alpha_vantage_api_key: Option<String>,

    /// News page URL with a `{symbol}` placeholder
    pub news_url_template: String,

    /// Characters per news chunk
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Number of chunks returned by similarity search
    pub top_k: usize,

    /// Trailing sessions compared to derive the price trend
    pub trend_window: usize,

    /// Longest market context shown in the brief before truncation
    pub context_preview_chars: usize,

    /// Clamp exposure into [0, 100]
    pub clamp_exposure: bool,

    /// Notional weight per symbol
    pub portfolio: PortfolioWeights,
}

impl Default for BriefConfig {
    fn default() -> Self {
        let mut portfolio = PortfolioWeights::new();
        portfolio.insert("TSM".to_string(), 1_000_000.0);

        Self {
            default_symbol: "TSM".to_string(),
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(1),
            secondary_requests_per_minute: 5,
            request_timeout: Duration::from_secs(30),
            alpha_vantage_api_key: None,
            news_url_template: "https://finance.yahoo.com/quote/{symbol}/news/".to_string(),
            chunk_size: 512,
            chunk_overlap: 50,
            top_k: 5,
            trend_window: 20,
            context_preview_chars: 200,
            clamp_exposure: true,
            portfolio,
        }
    }
}

impl BriefConfig {
    /// Create a new configuration builder
    pub fn builder() -> BriefConfigBuilder {
        BriefConfigBuilder::default()
    }

    /// Defaults overridden by `ALPHA_VANTAGE_API_KEY` and the `BRIEF_*` variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            default_symbol: env_string("BRIEF_DEFAULT_SYMBOL")
                .map(|s| s.to_uppercase())
                .unwrap_or(defaults.default_symbol),
            max_retries: env_or("BRIEF_MAX_RETRIES", defaults.max_retries),
            alpha_vantage_api_key: env_string("ALPHA_VANTAGE_API_KEY"),
            news_url_template: env_string("BRIEF_NEWS_URL").unwrap_or(defaults.news_url_template),
            chunk_size: env_or("BRIEF_CHUNK_SIZE", defaults.chunk_size),
            chunk_overlap: env_or("BRIEF_CHUNK_OVERLAP", defaults.chunk_overlap),
            top_k: env_or("BRIEF_TOP_K", defaults.top_k),
            clamp_exposure: env_flag("BRIEF_CLAMP_EXPOSURE", defaults.clamp_exposure),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_symbol.trim().is_empty() {
            return Err(BriefError::Config("default_symbol must not be empty".to_string()));
        }

        if self.max_retries == 0 {
            return Err(BriefError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if self.secondary_requests_per_minute == 0 {
            return Err(BriefError::Config(
                "secondary_requests_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(BriefError::Config(format!(
                "chunk_overlap ({}) must be smaller than a non-zero chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.top_k == 0 {
            return Err(BriefError::Config("top_k must be greater than 0".to_string()));
        }

        if !self.news_url_template.contains(SYMBOL_PLACEHOLDER) {
            return Err(BriefError::Config(format!(
                "news_url_template must contain {SYMBOL_PLACEHOLDER}"
            )));
        }

        check_weights(&self.portfolio)
    }

    /// Minimum spacing between two secondary-source calls
    pub fn secondary_call_interval(&self) -> Duration {
        Duration::from_secs(60) / self.secondary_requests_per_minute.max(1)
    }

    /// News page URL for `symbol`
    pub fn news_url(&self, symbol: &str) -> String {
        self.news_url_template.replace(SYMBOL_PLACEHOLDER, symbol)
    }
}

/// Reject negative or non-finite portfolio weights
pub fn check_weights(weights: &PortfolioWeights) -> Result<()> {
    match weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
        Some((symbol, weight)) => Err(BriefError::Config(format!(
            "portfolio weight for {symbol} must be a non-negative number, got {weight}"
        ))),
        None => Ok(()),
    }
}

/// Builder for BriefConfig
#[derive(Debug, Default)]
pub struct BriefConfigBuilder {
    default_symbol: Option<String>,
    max_retries: Option<u32>,
    retry_backoff_base: Option<Duration>,
    secondary_requests_per_minute: Option<u32>,
    request_timeout: Option<Duration>,
    alpha_vantage_api_key: Option<String>,
    news_url_template: Option<String>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    top_k: Option<usize>,
    trend_window: Option<usize>,
    context_preview_chars: Option<usize>,
    clamp_exposure: Option<bool>,
    portfolio: Option<PortfolioWeights>,
}

impl BriefConfigBuilder {
    /// Set the fallback symbol
    pub fn default_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.default_symbol = Some(symbol.into());
        self
    }

    /// Set maximum retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set the secondary source request ceiling
    pub fn secondary_requests_per_minute(mut self, rate: u32) -> Self {
        self.secondary_requests_per_minute = Some(rate);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Set the news URL template
    pub fn news_url_template(mut self, template: impl Into<String>) -> Self {
        self.news_url_template = Some(template.into());
        self
    }

    /// Set chunk size and overlap
    pub fn chunking(mut self, size: usize, overlap: usize) -> Self {
        self.chunk_size = Some(size);
        self.chunk_overlap = Some(overlap);
        self
    }

    /// Set the number of retrieved chunks
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Set the trailing trend window
    pub fn trend_window(mut self, sessions: usize) -> Self {
        self.trend_window = Some(sessions);
        self
    }

    /// Set the market context preview length
    pub fn context_preview_chars(mut self, chars: usize) -> Self {
        self.context_preview_chars = Some(chars);
        self
    }

    /// Enable or disable exposure clamping
    pub fn clamp_exposure(mut self, clamp: bool) -> Self {
        self.clamp_exposure = Some(clamp);
        self
    }

    /// Set portfolio weights
    pub fn portfolio(mut self, weights: PortfolioWeights) -> Self {
        self.portfolio = Some(weights);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<BriefConfig> {
        let defaults = BriefConfig::default();

        let config = BriefConfig {
            default_symbol: self.default_symbol.unwrap_or(defaults.default_symbol),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff_base: self.retry_backoff_base.unwrap_or(defaults.retry_backoff_base),
            secondary_requests_per_minute: self
                .secondary_requests_per_minute
                .unwrap_or(defaults.secondary_requests_per_minute),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            news_url_template: self.news_url_template.unwrap_or(defaults.news_url_template),
            chunk_size: self.chunk_size.unwrap_or(defaults.chunk_size),
            chunk_overlap: self.chunk_overlap.unwrap_or(defaults.chunk_overlap),
            top_k: self.top_k.unwrap_or(defaults.top_k),
            trend_window: self.trend_window.unwrap_or(defaults.trend_window),
            context_preview_chars: self
                .context_preview_chars
                .unwrap_or(defaults.context_preview_chars),
            clamp_exposure: self.clamp_exposure.unwrap_or(defaults.clamp_exposure),
            portfolio: self.portfolio.unwrap_or(defaults.portfolio),
        };

        config.validate()?;
        Ok(config)
    }
}
