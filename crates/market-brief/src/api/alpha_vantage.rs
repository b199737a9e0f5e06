//! Alpha Vantage API client

use crate::api::MarketDataSource;
use crate::config::BriefConfig;
use crate::error::{BriefError, Result};
use crate::model::{CompanyProfile, DailyBar, EarningsRecord, MarketQuote};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// `TIME_SERIES_DAILY` payload
#[derive(Debug, Deserialize)]
struct DailySeries {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<String, DailyValues>>,
}

#[derive(Debug, Deserialize)]
struct DailyValues {
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// `EARNINGS` payload
#[derive(Debug, Deserialize)]
struct Earnings {
    #[serde(rename = "quarterlyEarnings", default)]
    quarterly: Vec<QuarterlyEarnings>,
}

#[derive(Debug, Deserialize)]
struct QuarterlyEarnings {
    #[serde(rename = "reportedEPS")]
    reported_eps: Option<String>,
    #[serde(rename = "estimatedEPS")]
    estimated_eps: Option<String>,
}

/// `SYMBOL_SEARCH` payload
#[derive(Debug, Deserialize)]
struct SymbolSearch {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<SymbolMatch>,
}

#[derive(Debug, Deserialize)]
struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
}

/// `OVERVIEW` payload, trimmed to the fields a quote needs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompanyOverview {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_cap: Option<String>,
}

impl CompanyOverview {
    /// Missing or "None" fields become the unknown sector and a zero market cap
    pub fn profile(&self) -> CompanyProfile {
        let sector = self
            .sector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
            .unwrap_or(MarketQuote::UNKNOWN_SECTOR);

        CompanyProfile {
            sector: sector.to_string(),
            market_cap: parse_number(self.market_cap.as_deref()),
        }
    }
}

/// Alpha Vantage API client
///
/// Every call waits on a limiter that admits one request per
/// `call_interval`, keeping the client under the free-tier ceiling.
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
    trend_window: usize,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `call_interval` - Minimum spacing between requests (12s on the free tier)
    /// * `timeout` - Per-request timeout
    /// * `trend_window` - Trailing sessions used for the price trend
    pub fn new(
        api_key: impl Into<String>,
        call_interval: Duration,
        timeout: Duration,
        trend_window: usize,
    ) -> Result<Self> {
        let quota = Quota::with_period(call_interval).ok_or_else(|| {
            BriefError::Config("Alpha Vantage call interval must be non-zero".to_string())
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            trend_window,
        })
    }

    /// Create from a validated configuration; the API key is required
    pub fn from_config(config: &BriefConfig) -> Result<Self> {
        let api_key = config.alpha_vantage_api_key.clone().ok_or_else(|| {
            BriefError::Config("ALPHA_VANTAGE_API_KEY environment variable not set".to_string())
        })?;

        Self::new(
            api_key,
            config.secondary_call_interval(),
            config.request_timeout,
            config.trend_window,
        )
    }

    /// Issue one paced request, screen the body for provider errors and
    /// deserialize what is left
    async fn query<T: DeserializeOwned>(&self, symbol: &str, params: &[(&str, &str)]) -> Result<T> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(BASE_URL)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BriefError::RateLimited {
                provider: PROVIDER.to_string(),
            });
        }

        if !response.status().is_success() {
            return Err(BriefError::AlphaVantage(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: Value = response.json().await?;
        Ok(serde_json::from_value(check_body(symbol, data)?)?)
    }

    /// Get daily time series data
    pub async fn get_daily(&self, symbol: &str) -> Result<Vec<DailyBar>> {
        let data: DailySeries = self
            .query(
                symbol,
                &[
                    ("function", "TIME_SERIES_DAILY"),
                    ("symbol", symbol),
                    ("outputsize", "compact"),
                ],
            )
            .await?;

        daily_bars(symbol, data)
    }

    /// Get the most recent quarterly earnings
    pub async fn get_quarterly_earnings(&self, symbol: &str) -> Result<EarningsRecord> {
        let data: Earnings = self
            .query(symbol, &[("function", "EARNINGS"), ("symbol", symbol)])
            .await?;

        latest_earnings(symbol, &data)
    }

    /// Get company overview and fundamental data
    pub async fn get_company_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        self.query(symbol, &[("function", "OVERVIEW"), ("symbol", symbol)])
            .await
    }

    /// Whether a symbol search returns an exact match
    pub async fn search_symbol(&self, symbol: &str) -> Result<bool> {
        let data: SymbolSearch = self
            .query(symbol, &[("function", "SYMBOL_SEARCH"), ("keywords", symbol)])
            .await?;

        Ok(data
            .best_matches
            .iter()
            .any(|m| m.symbol.eq_ignore_ascii_case(symbol)))
    }
}

#[async_trait]
impl MarketDataSource for AlphaVantageClient {
    async fn validate(&self, symbol: &str) -> Result<bool> {
        self.search_symbol(symbol).await
    }

    async fn get_quote(&self, symbol: &str) -> Result<MarketQuote> {
        let bars = self.get_daily(symbol).await?;
        MarketQuote::from_daily_bars(&bars, self.trend_window)
            .ok_or_else(|| BriefError::unavailable(symbol, "empty daily series"))
    }

    async fn get_earnings(&self, symbol: &str) -> Result<EarningsRecord> {
        self.get_quarterly_earnings(symbol).await
    }

    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        Ok(self.get_company_overview(symbol).await?.profile())
    }
}

/// Translate Alpha Vantage's in-body error conventions into errors
fn check_body(symbol: &str, data: Value) -> Result<Value> {
    if data.get("Error Message").is_some() {
        return Err(BriefError::NotFound {
            symbol: symbol.to_string(),
        });
    }

    // Throttled responses arrive as 200 with a "Note" or "Information" message.
    let throttle_message = ["Note", "Information"]
        .iter()
        .filter_map(|key| data.get(*key).and_then(Value::as_str))
        .any(|msg| {
            let msg = msg.to_lowercase();
            msg.contains("call frequency") || msg.contains("rate limit") || msg.contains("call limit")
        });
    if throttle_message {
        return Err(BriefError::RateLimited {
            provider: PROVIDER.to_string(),
        });
    }

    if data.as_object().is_none_or(serde_json::Map::is_empty) {
        return Err(BriefError::unavailable(symbol, "empty response body"));
    }

    Ok(data)
}

/// Alpha Vantage encodes numbers as strings; "None" and missing values read as 0
fn parse_number(value: Option<&str>) -> f64 {
    value
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn daily_bars(symbol: &str, data: DailySeries) -> Result<Vec<DailyBar>> {
    let series = data
        .series
        .ok_or_else(|| BriefError::unavailable(symbol, "no daily series in response"))?;

    Ok(series
        .into_iter()
        .map(|(date, values)| DailyBar {
            date,
            close: parse_number(Some(values.close.as_str())),
            volume: parse_number(Some(values.volume.as_str())) as u64,
        })
        .collect())
}

fn latest_earnings(symbol: &str, data: &Earnings) -> Result<EarningsRecord> {
    let latest = data
        .quarterly
        .first()
        .ok_or_else(|| BriefError::unavailable(symbol, "no quarterly earnings in response"))?;

    Ok(EarningsRecord::new(
        parse_number(latest.reported_eps.as_deref()),
        parse_number(latest.estimated_eps.as_deref()),
    ))
}
