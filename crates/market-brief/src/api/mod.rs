//! Market data providers
//!
//! [`MarketDataSource`] is the narrow seam the rest of the crate talks to.
//! Yahoo Finance is the primary source; Alpha Vantage is the rate-limited
//! secondary.

pub mod alpha_vantage;
pub mod yahoo;

use crate::error::Result;
use crate::model::{CompanyProfile, EarningsRecord, MarketQuote};
use async_trait::async_trait;

pub use alpha_vantage::AlphaVantageClient;
pub use yahoo::YahooFinanceClient;

/// A provider of quotes, earnings, company profiles and symbol existence checks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Lightweight existence check for `symbol`
    async fn validate(&self, symbol: &str) -> Result<bool>;

    /// Latest quote with a trailing-window trend
    async fn get_quote(&self, symbol: &str) -> Result<MarketQuote>;

    /// Latest quarterly reported and estimated EPS
    async fn get_earnings(&self, symbol: &str) -> Result<EarningsRecord>;

    /// Sector and market capitalisation
    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile>;
}
