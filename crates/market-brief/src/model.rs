//! Data carried through a single query

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Notional weight per symbol, in currency units
pub type PortfolioWeights = BTreeMap<String, f64>;

/// Quotes keyed by symbol
pub type QuoteMap = BTreeMap<String, MarketQuote>;

/// Coarse direction of the trailing price window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Up,
    Down,
    #[default]
    Unknown,
}

impl PriceTrend {
    /// Compare the newest close against the oldest close of the window.
    pub fn from_closes(closes: &[f64]) -> Self {
        match (closes.first(), closes.last()) {
            (Some(first), Some(last)) if closes.len() >= 2 => {
                if last > first {
                    Self::Up
                } else {
                    Self::Down
                }
            },
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PriceTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One daily session of a price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Session date, `YYYY-MM-DD`
    pub date: String,
    pub close: f64,
    pub volume: u64,
}

/// Per-symbol market snapshot.
///
/// Zero values mean "unavailable", never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub price: f64,
    pub volume: u64,
    pub market_cap: f64,
    pub sector: String,
    pub price_trend: PriceTrend,
}

impl MarketQuote {
    pub const UNKNOWN_SECTOR: &'static str = "Unknown";

    /// The sentinel emitted when every source failed
    pub fn unavailable() -> Self {
        Self {
            price: 0.0,
            volume: 0,
            market_cap: 0.0,
            sector: Self::UNKNOWN_SECTOR.to_string(),
            price_trend: PriceTrend::Unknown,
        }
    }

    /// Build a quote from a daily series in any order.
    ///
    /// The newest bar supplies price and volume; the trend compares the newest
    /// close with the oldest close of the trailing `window` sessions. Returns
    /// `None` for an empty series.
    pub fn from_daily_bars(bars: &[DailyBar], window: usize) -> Option<Self> {
        let mut sorted: Vec<&DailyBar> = bars.iter().collect();
        sorted.sort_by(|a, b| a.date.cmp(&b.date));

        let latest = sorted.last()?;
        let start = sorted.len().saturating_sub(window.max(2));
        let closes: Vec<f64> = sorted[start..].iter().map(|b| b.close).collect();

        Some(Self {
            price: latest.close,
            volume: latest.volume,
            market_cap: 0.0,
            sector: Self::UNKNOWN_SECTOR.to_string(),
            price_trend: PriceTrend::from_closes(&closes),
        })
    }

    /// Whether the quote carries a usable price
    pub fn has_data(&self) -> bool {
        self.price > 0.0
    }

    /// Sector, or `None` when it is the unknown placeholder
    pub fn known_sector(&self) -> Option<&str> {
        let sector = self.sector.trim();
        if sector.is_empty() || sector.eq_ignore_ascii_case(Self::UNKNOWN_SECTOR) {
            None
        } else {
            Some(sector)
        }
    }

    /// Whether sector or market cap is still a sentinel
    pub fn needs_profile(&self) -> bool {
        self.has_data() && (self.known_sector().is_none() || self.market_cap <= 0.0)
    }

    /// Fill sentinel sector and market cap from `profile`; known values win
    pub fn with_profile(mut self, profile: &CompanyProfile) -> Self {
        if self.known_sector().is_none() && !profile.sector.trim().is_empty() {
            self.sector = profile.sector.trim().to_string();
        }
        if self.market_cap <= 0.0 && profile.market_cap.is_finite() && profile.market_cap > 0.0 {
            self.market_cap = profile.market_cap;
        }
        self
    }
}

/// Company reference data that the price series does not carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub sector: String,
    pub market_cap: f64,
}

impl Default for MarketQuote {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Latest reported and consensus earnings per share; 0 when unavailable
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub reported_eps: f64,
    pub estimated_eps: f64,
}

impl EarningsRecord {
    pub fn new(reported_eps: f64, estimated_eps: f64) -> Self {
        Self {
            reported_eps,
            estimated_eps,
        }
    }

    /// The sentinel emitted when every source failed
    pub fn unavailable() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64, volume: u64) -> DailyBar {
        DailyBar {
            date: date.to_string(),
            close,
            volume,
        }
    }

    #[test]
    fn test_trend_from_closes() {
        assert_eq!(PriceTrend::from_closes(&[100.0, 98.0, 105.0]), PriceTrend::Up);
        assert_eq!(PriceTrend::from_closes(&[100.0, 120.0, 99.0]), PriceTrend::Down);
        assert_eq!(PriceTrend::from_closes(&[100.0, 100.0]), PriceTrend::Down);
        assert_eq!(PriceTrend::from_closes(&[100.0]), PriceTrend::Unknown);
        assert_eq!(PriceTrend::from_closes(&[]), PriceTrend::Unknown);
    }

    #[test]
    fn test_quote_from_unsorted_bars() {
        let bars = vec![
            bar("2026-10-15", 148.0, 1_500_000),
            bar("2026-10-13", 140.0, 1_000_000),
            bar("2026-10-16", 150.0, 2_000_000),
        ];

        let quote = MarketQuote::from_daily_bars(&bars, 20).unwrap();
        assert_eq!(quote.price, 150.0);
        assert_eq!(quote.volume, 2_000_000);
        assert_eq!(quote.price_trend, PriceTrend::Up);
        assert_eq!(quote.sector, "Unknown");
    }

    #[test]
    fn test_quote_trend_uses_trailing_window_only() {
        let bars = vec![
            bar("2026-10-01", 10.0, 1),
            bar("2026-10-02", 200.0, 1),
            bar("2026-10-03", 150.0, 1),
        ];

        // The whole series rises, the last two sessions fall.
        let quote = MarketQuote::from_daily_bars(&bars, 2).unwrap();
        assert_eq!(quote.price_trend, PriceTrend::Down);
    }

    #[test]
    fn test_quote_from_empty_series() {
        assert!(MarketQuote::from_daily_bars(&[], 20).is_none());
    }

    #[test]
    fn test_unavailable_sentinel() {
        let quote = MarketQuote::unavailable();
        assert_eq!(quote.price, 0.0);
        assert_eq!(quote.volume, 0);
        assert_eq!(quote.market_cap, 0.0);
        assert_eq!(quote.sector, "Unknown");
        assert_eq!(quote.price_trend, PriceTrend::Unknown);
        assert!(!quote.has_data());
        assert!(quote.known_sector().is_none());
    }

    #[test]
    fn test_profile_fills_sentinels_only() {
        let bars = vec![bar("2026-10-16", 150.0, 2_000_000)];
        let quote = MarketQuote::from_daily_bars(&bars, 20).unwrap();
        assert!(quote.needs_profile());

        let profile = CompanyProfile {
            sector: "Technology".to_string(),
            market_cap: 800e9,
        };
        let quote = quote.with_profile(&profile);
        assert_eq!(quote.sector, "Technology");
        assert_eq!(quote.market_cap, 800e9);
        assert!(!quote.needs_profile());

        let other = CompanyProfile {
            sector: "Energy".to_string(),
            market_cap: 0.0,
        };
        assert_eq!(quote.with_profile(&other).sector, "Technology");
    }

    #[test]
    fn test_unavailable_quote_needs_no_profile() {
        assert!(!MarketQuote::unavailable().needs_profile());
    }

    #[test]
    fn test_trend_serializes_lowercase() {
        let json = serde_json::to_string(&PriceTrend::Up).unwrap();
        assert_eq!(json, "\"up\"");
    }
}
