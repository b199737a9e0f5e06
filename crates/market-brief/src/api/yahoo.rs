//! Yahoo Finance API client

use crate::api::MarketDataSource;
use crate::error::{BriefError, Result};
use crate::model::{CompanyProfile, DailyBar, EarningsRecord, MarketQuote};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

/// Calendar days fetched to cover the trend window with weekends and holidays
const HISTORY_DAYS_PER_SESSION: i64 = 2;

/// Yahoo Finance API client
pub struct YahooFinanceClient {
    connector: yahoo::YahooConnector,
    trend_window: usize,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(trend_window: usize) -> Result<Self> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| BriefError::Yahoo(e.to_string()))?;

        Ok(Self {
            connector,
            trend_window,
        })
    }

    /// Get daily bars covering the trailing trend window
    pub async fn get_daily_bars(&self, symbol: &str) -> Result<Vec<DailyBar>> {
        let end = Utc::now();
        let days = (self.trend_window.max(2) as i64) * HISTORY_DAYS_PER_SESSION;
        let start = end - chrono::Duration::days(days);

        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| BriefError::Yahoo(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| BriefError::Yahoo(format!("Invalid end timestamp: {e}")))?;

        let response = self
            .connector
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| classify_error(symbol, &e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| classify_error(symbol, &e.to_string()))?;

        Ok(quotes
            .iter()
            .filter(|q| q.close > 0.0)
            .map(|q| DailyBar {
                date: DateTime::from_timestamp(q.timestamp as i64, 0)
                    .unwrap_or_else(Utc::now)
                    .format("%Y-%m-%d")
                    .to_string(),
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }
}

/// Map a Yahoo error message onto the provider error taxonomy
fn classify_error(symbol: &str, message: &str) -> BriefError {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("too many requests") {
        BriefError::RateLimited {
            provider: "Yahoo Finance".to_string(),
        }
    } else if lower.contains("not found") || lower.contains("no data") || lower.contains("404") {
        BriefError::NotFound {
            symbol: symbol.to_string(),
        }
    } else {
        BriefError::Yahoo(message.to_string())
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn validate(&self, symbol: &str) -> Result<bool> {
        match self.connector.get_latest_quotes(symbol, "1d").await {
            Ok(response) => Ok(response.last_quote().is_ok()),
            Err(e) => match classify_error(symbol, &e.to_string()) {
                BriefError::RateLimited { provider } => Err(BriefError::RateLimited { provider }),
                _ => Ok(false),
            },
        }
    }

    async fn get_quote(&self, symbol: &str) -> Result<MarketQuote> {
        let bars = self.get_daily_bars(symbol).await?;
        MarketQuote::from_daily_bars(&bars, self.trend_window)
            .ok_or_else(|| BriefError::unavailable(symbol, "empty price series"))
    }

    async fn get_earnings(&self, symbol: &str) -> Result<EarningsRecord> {
        // The chart API carries no EPS data.
        Err(BriefError::unavailable(
            symbol,
            "earnings are not offered by the Yahoo chart API",
        ))
    }

    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        Err(BriefError::unavailable(
            symbol,
            "company profiles are not offered by the Yahoo chart API",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        let err = classify_error("TSM", "fetching the data from yahoo! finance failed: 429 Too Many Requests");
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify_error("ZZZZ", "No data found, symbol may be delisted");
        assert!(matches!(err, BriefError::NotFound { symbol } if symbol == "ZZZZ"));
    }

    #[test]
    fn test_classify_other() {
        let err = classify_error("TSM", "connection reset");
        assert!(matches!(err, BriefError::Yahoo(_)));
    }

    #[tokio::test]
    async fn test_earnings_unavailable() {
        let client = YahooFinanceClient::new(20).unwrap();
        let result = client.get_earnings("TSM").await;
        assert!(matches!(result, Err(BriefError::Unavailable { .. })));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_quote() {
        let client = YahooFinanceClient::new(20).unwrap();
        let quote = client.get_quote("AAPL").await.unwrap();
        assert!(quote.price > 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_validate_symbol() {
        let client = YahooFinanceClient::new(20).unwrap();

        assert!(client.validate("AAPL").await.unwrap());
        assert!(!client.validate("INVALID_SYMBOL_12345").await.unwrap());
    }
}
