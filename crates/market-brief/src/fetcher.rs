//! Per-symbol quote and earnings retrieval with provider fallback
//!
//! The primary source is tried once. On any failure the secondary source is
//! called under the retry policy, which only repeats rate-limited calls. When
//! both fail the symbol gets a zero sentinel; this module never returns an
//! error to its caller.
//!
//! A priced quote still missing its sector or market cap is enriched from a
//! company profile under the same primary/secondary policy. A missing profile
//! leaves those sentinels in place.

use crate::api::MarketDataSource;
use crate::error::{BriefError, Result};
use crate::model::{CompanyProfile, EarningsRecord, MarketQuote, QuoteMap};
use crate::retry::RetryPolicy;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fetches market data from a primary source with a secondary fallback
pub struct MarketDataFetcher {
    primary: Arc<dyn MarketDataSource>,
    secondary: Arc<dyn MarketDataSource>,
    retry: RetryPolicy,
}

impl MarketDataFetcher {
    pub fn new(
        primary: Arc<dyn MarketDataSource>,
        secondary: Arc<dyn MarketDataSource>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            primary,
            secondary,
            retry,
        }
    }

    /// Quotes for every symbol; failed symbols map to [`MarketQuote::unavailable`]
    pub async fn fetch(&self, symbols: &[String]) -> QuoteMap {
        let mut quotes = BTreeMap::new();
        for symbol in symbols {
            let quote = self.fetch_quote(symbol).await;
            quotes.insert(symbol.clone(), quote);
        }
        quotes
    }

    /// Quote for one symbol, never failing
    pub async fn fetch_quote(&self, symbol: &str) -> MarketQuote {
        let quote = self.fetch_price(symbol).await;
        if !quote.needs_profile() {
            return quote;
        }

        match self.fetch_profile(symbol).await {
            Some(profile) => quote.with_profile(&profile),
            None => quote,
        }
    }

    /// Sector and market cap for one symbol; `None` when no source has them
    pub async fn fetch_profile(&self, symbol: &str) -> Option<CompanyProfile> {
        match self.primary.get_profile(symbol).await {
            Ok(profile) => return Some(profile),
            Err(e) => {
                debug!(symbol, error = %e, "primary profile failed, falling back to secondary source");
            },
        }

        let secondary = Arc::clone(&self.secondary);
        let result = self
            .retry
            .execute("secondary profile", || {
                let secondary = Arc::clone(&secondary);
                async move { secondary.get_profile(symbol).await }
            })
            .await;

        match result {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(symbol, error = %e, "no company profile, keeping sector and market cap sentinels");
                None
            },
        }
    }

    async fn fetch_price(&self, symbol: &str) -> MarketQuote {
        match self.primary.get_quote(symbol).await.and_then(|q| complete_quote(symbol, q)) {
            Ok(quote) => {
                debug!(symbol, price = quote.price, trend = %quote.price_trend, "primary quote");
                return quote;
            },
            Err(e) => {
                info!(symbol, error = %e, "primary quote failed, falling back to secondary source");
            },
        }

        let secondary = Arc::clone(&self.secondary);
        let result = self
            .retry
            .execute("secondary quote", || {
                let secondary = Arc::clone(&secondary);
                async move {
                    let quote = secondary.get_quote(symbol).await?;
                    complete_quote(symbol, quote)
                }
            })
            .await;

        match result {
            Ok(quote) => quote,
            Err(e) => {
                error!(symbol, error = %e, "all quote sources failed, using zero sentinel");
                MarketQuote::unavailable()
            },
        }
    }

    /// Earnings for one symbol, never failing
    pub async fn fetch_earnings(&self, symbol: &str) -> EarningsRecord {
        match self.primary.get_earnings(symbol).await {
            Ok(record) => return record,
            Err(e) => {
                debug!(symbol, error = %e, "primary earnings failed, falling back to secondary source");
            },
        }

        let secondary = Arc::clone(&self.secondary);
        let result = self
            .retry
            .execute("secondary earnings", || {
                let secondary = Arc::clone(&secondary);
                async move { secondary.get_earnings(symbol).await }
            })
            .await;

        match result {
            Ok(record) => record,
            Err(e) => {
                error!(symbol, error = %e, "all earnings sources failed, using zero sentinel");
                EarningsRecord::unavailable()
            },
        }
    }

    /// Earnings for every symbol
    pub async fn fetch_all_earnings(&self, symbols: &[String]) -> BTreeMap<String, EarningsRecord> {
        let mut earnings = BTreeMap::new();
        for symbol in symbols {
            let record = self.fetch_earnings(symbol).await;
            earnings.insert(symbol.clone(), record);
        }
        earnings
    }
}

/// A quote without a positive price counts as incomplete
fn complete_quote(symbol: &str, quote: MarketQuote) -> Result<MarketQuote> {
    if quote.has_data() {
        Ok(quote)
    } else {
        warn!(symbol, "quote is missing a price");
        Err(BriefError::unavailable(symbol, "quote is missing a price"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMarketDataSource;
    use crate::model::PriceTrend;
    use std::time::Duration;

    fn quote(price: f64) -> MarketQuote {
        MarketQuote {
            price,
            volume: 2_000_000,
            market_cap: 750e9,
            sector: "Technology".to_string(),
            price_trend: PriceTrend::Up,
        }
    }

    fn rate_limited() -> BriefError {
        BriefError::RateLimited {
            provider: "Alpha Vantage".to_string(),
        }
    }

    fn fetcher(primary: MockMarketDataSource, secondary: MockMarketDataSource) -> MarketDataFetcher {
        MarketDataFetcher::new(
            Arc::new(primary),
            Arc::new(secondary),
            RetryPolicy::new(3, Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let mut primary = MockMarketDataSource::new();
        primary.expect_get_quote().times(1).returning(|_| Ok(quote(150.0)));
        let mut secondary = MockMarketDataSource::new();
        secondary.expect_get_quote().never();

        let quotes = fetcher(primary, secondary).fetch(&["TSM".to_string()]).await;
        assert_eq!(quotes["TSM"], quote(150.0));
    }

    #[tokio::test]
    async fn test_empty_primary_series_falls_back() {
        let mut primary = MockMarketDataSource::new();
        primary
            .expect_get_quote()
            .returning(|_| Err(BriefError::unavailable("TSM", "empty price series")));
        let mut secondary = MockMarketDataSource::new();
        secondary.expect_get_quote().times(1).returning(|_| Ok(quote(149.0)));

        let quote = fetcher(primary, secondary).fetch_quote("TSM").await;
        assert_eq!(quote.price, 149.0);
    }

    #[tokio::test]
    async fn test_zero_price_primary_counts_as_incomplete() {
        let mut primary = MockMarketDataSource::new();
        primary.expect_get_quote().returning(|_| Ok(quote(0.0)));
        let mut secondary = MockMarketDataSource::new();
        secondary.expect_get_quote().times(1).returning(|_| Ok(quote(151.0)));

        let quote = fetcher(primary, secondary).fetch_quote("TSM").await;
        assert_eq!(quote.price, 151.0);
    }

    #[tokio::test]
    async fn test_both_sources_fail_yields_zero_sentinel() {
        let mut primary = MockMarketDataSource::new();
        primary
            .expect_get_quote()
            .returning(|_| Err(BriefError::unavailable("TSM", "empty price series")));
        let mut secondary = MockMarketDataSource::new();
        secondary.expect_get_quote().times(3).returning(|_| Err(rate_limited()));

        let quotes = fetcher(primary, secondary).fetch(&["TSM".to_string()]).await;
        let quote = &quotes["TSM"];
        assert_eq!(quote.price, 0.0);
        assert_eq!(quote.volume, 0);
        assert_eq!(quote.market_cap, 0.0);
        assert_eq!(quote.sector, "Unknown");
        assert_eq!(quote.price_trend, PriceTrend::Unknown);
    }

    #[tokio::test]
    async fn test_non_rate_limit_secondary_failure_is_not_retried() {
        let mut primary = MockMarketDataSource::new();
        primary.expect_get_quote().returning(|_| Err(BriefError::Yahoo("boom".to_string())));
        let mut secondary = MockMarketDataSource::new();
        secondary
            .expect_get_quote()
            .times(1)
            .returning(|_| Err(BriefError::AlphaVantage("HTTP error: 500".to_string())));

        let quote = fetcher(primary, secondary).fetch_quote("TSM").await;
        assert_eq!(quote, MarketQuote::unavailable());
    }

    #[tokio::test]
    async fn test_secondary_recovers_after_rate_limit() {
        let mut primary = MockMarketDataSource::new();
        primary.expect_get_quote().returning(|_| Err(BriefError::Yahoo("boom".to_string())));
        let mut secondary = MockMarketDataSource::new();
        let mut seq = mockall::Sequence::new();
        secondary
            .expect_get_quote()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(rate_limited()));
        secondary
            .expect_get_quote()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(quote(152.0)));

        let quote = fetcher(primary, secondary).fetch_quote("TSM").await;
        assert_eq!(quote.price, 152.0);
    }

    fn unprofiled(price: f64) -> MarketQuote {
        MarketQuote {
            market_cap: 0.0,
            sector: MarketQuote::UNKNOWN_SECTOR.to_string(),
            ..quote(price)
        }
    }

    fn profile() -> CompanyProfile {
        CompanyProfile {
            sector: "Technology".to_string(),
            market_cap: 750e9,
        }
    }

    #[tokio::test]
    async fn test_profile_fills_sector_and_market_cap() {
        let mut primary = MockMarketDataSource::new();
        primary.expect_get_quote().returning(|_| Ok(unprofiled(150.0)));
        primary
            .expect_get_profile()
            .times(1)
            .returning(|_| Err(BriefError::unavailable("TSM", "not offered")));
        let mut secondary = MockMarketDataSource::new();
        secondary.expect_get_profile().times(1).returning(|_| Ok(profile()));

        let quote = fetcher(primary, secondary).fetch_quote("TSM").await;
        assert_eq!(quote.price, 150.0);
        assert_eq!(quote.sector, "Technology");
        assert_eq!(quote.market_cap, 750e9);
    }

    #[tokio::test]
    async fn test_profile_failure_keeps_sentinels() {
        let mut primary = MockMarketDataSource::new();
        primary.expect_get_quote().returning(|_| Ok(unprofiled(150.0)));
        primary
            .expect_get_profile()
            .returning(|_| Err(BriefError::unavailable("TSM", "not offered")));
        let mut secondary = MockMarketDataSource::new();
        secondary.expect_get_profile().times(3).returning(|_| Err(rate_limited()));

        let quote = fetcher(primary, secondary).fetch_quote("TSM").await;
        assert_eq!(quote.price, 150.0);
        assert_eq!(quote.sector, "Unknown");
        assert_eq!(quote.market_cap, 0.0);
    }

    #[tokio::test]
    async fn test_sentinel_quote_skips_profile() {
        let mut primary = MockMarketDataSource::new();
        primary.expect_get_quote().returning(|_| Err(BriefError::Yahoo("boom".to_string())));
        primary.expect_get_profile().never();
        let mut secondary = MockMarketDataSource::new();
        secondary
            .expect_get_quote()
            .returning(|_| Err(BriefError::AlphaVantage("HTTP error: 500".to_string())));
        secondary.expect_get_profile().never();

        let quote = fetcher(primary, secondary).fetch_quote("TSM").await;
        assert_eq!(quote, MarketQuote::unavailable());
    }

    #[tokio::test]
    async fn test_earnings_fallback_to_secondary() {
        let mut primary = MockMarketDataSource::new();
        primary
            .expect_get_earnings()
            .returning(|_| Err(BriefError::unavailable("TSM", "not offered")));
        let mut secondary = MockMarketDataSource::new();
        secondary
            .expect_get_earnings()
            .times(1)
            .returning(|_| Ok(EarningsRecord::new(1.06, 1.0)));

        let record = fetcher(primary, secondary).fetch_earnings("TSM").await;
        assert_eq!(record, EarningsRecord::new(1.06, 1.0));
    }

    #[tokio::test]
    async fn test_earnings_total_failure_yields_zero_sentinel() {
        let mut primary = MockMarketDataSource::new();
        primary
            .expect_get_earnings()
            .returning(|_| Err(BriefError::unavailable("TSM", "not offered")));
        let mut secondary = MockMarketDataSource::new();
        secondary.expect_get_earnings().times(3).returning(|_| Err(rate_limited()));

        let all = fetcher(primary, secondary)
            .fetch_all_earnings(&["TSM".to_string()])
            .await;
        assert_eq!(all["TSM"], EarningsRecord::new(0.0, 0.0));
    }
}
