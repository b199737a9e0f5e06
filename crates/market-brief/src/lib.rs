//! Morning market brief pipeline
//!
//! Turns a free-text question about a portfolio into a short markdown brief:
//!
//! - Ticker extraction from the query, validated against the market data provider
//! - Quotes and earnings from Yahoo Finance, with Alpha Vantage as a rate-limited fallback
//! - News scraping, chunking and similarity retrieval for market context
//! - Portfolio exposure and earnings surprise figures
//! - Rule-based prediction and strategy sentences
//!
//! # Architecture
//!
//! [`Orchestrator`] runs each query through a fixed sequence of [`Stage`]s.
//! Provider failures degrade to zero sentinels inside [`MarketDataFetcher`]
//! and retrieval failures to an empty market context inside
//! [`NewsRetriever`]; any other failure aborts the query with a single error
//! bullet.
//!
//! # Example
//!
//! ```rust,ignore
//! use market_brief::{BriefConfig, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BriefConfig::from_env()?;
//!     let mut orchestrator = Orchestrator::from_config(config)?;
//!
//!     let brief = orchestrator
//!         .process_query("What is our risk exposure in Asia tech stocks today?", &[])
//!         .await;
//!     println!("{brief}");
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod api;
pub mod brief;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod model;
pub mod narrative;
pub mod news;
pub mod orchestrator;
pub mod retry;

pub use analysis::QuantAnalyzer;
pub use api::{AlphaVantageClient, MarketDataSource, YahooFinanceClient};
pub use brief::{Brief, ERROR_RESPONSE, NO_QUERY_RESPONSE, speech_text};
pub use config::{BriefConfig, BriefConfigBuilder};
pub use error::{BriefError, Result};
pub use extractor::SymbolExtractor;
pub use fetcher::MarketDataFetcher;
pub use model::{
    CompanyProfile, DailyBar, EarningsRecord, MarketQuote, PortfolioWeights, PriceTrend, QuoteMap,
};
pub use narrative::NarrativeGenerator;
#[cfg(feature = "fastembed")]
pub use news::FastEmbedder;
pub use news::{
    Embedder, HashingEmbedder, HttpScraper, InMemoryIndex, NewsIndex, NewsRetriever, NewsSource,
};
pub use orchestrator::{Orchestrator, Stage};
pub use retry::RetryPolicy;
