//! The per-query pipeline
//!
//! A query moves through a fixed sequence of stages. Market data failures are
//! absorbed by the fetcher as zero sentinels and retrieval failures by the
//! news retriever as empty context. An error that escapes a stage aborts the
//! query, discards partial results and yields [`ERROR_RESPONSE`].

use crate::analysis::QuantAnalyzer;
use crate::api::{AlphaVantageClient, MarketDataSource, YahooFinanceClient};
use crate::brief::{Brief, ERROR_RESPONSE, NO_QUERY_RESPONSE, SymbolLine, truncate_context};
use crate::config::{BriefConfig, check_weights};
use crate::error::Result;
use crate::extractor::SymbolExtractor;
use crate::fetcher::MarketDataFetcher;
use crate::model::PortfolioWeights;
use crate::narrative::NarrativeGenerator;
use crate::news::{
    Embedder, HashingEmbedder, HttpScraper, InMemoryIndex, NewsIndex, NewsRetriever, NewsSource,
};
use crate::retry::RetryPolicy;
use chrono::Utc;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Pipeline position of the current query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    ExtractSymbols,
    FetchMarketData,
    FetchEarnings,
    ScrapeNews,
    IndexAndRetrieve,
    Analyze,
    Narrate,
    Format,
    Done,
    Error,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ExtractSymbols => "extract_symbols",
            Self::FetchMarketData => "fetch_market_data",
            Self::FetchEarnings => "fetch_earnings",
            Self::ScrapeNews => "scrape_news",
            Self::IndexAndRetrieve => "index_and_retrieve",
            Self::Analyze => "analyze",
            Self::Narrate => "narrate",
            Self::Format => "format",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs queries end to end and owns every long-lived service handle
pub struct Orchestrator {
    config: BriefConfig,
    primary: Arc<dyn MarketDataSource>,
    extractor: SymbolExtractor,
    fetcher: MarketDataFetcher,
    retriever: NewsRetriever,
    analyzer: QuantAnalyzer,
    narrator: NarrativeGenerator,
    portfolio: PortfolioWeights,
    stage: Stage,
}

impl Orchestrator {
    pub fn new(
        config: BriefConfig,
        primary: Arc<dyn MarketDataSource>,
        secondary: Arc<dyn MarketDataSource>,
        news_source: Arc<dyn NewsSource>,
        index: Box<dyn NewsIndex>,
    ) -> Self {
        let fetcher = MarketDataFetcher::new(
            Arc::clone(&primary),
            secondary,
            RetryPolicy::from_config(&config),
        );

        Self {
            extractor: SymbolExtractor::new(config.default_symbol.clone()),
            retriever: NewsRetriever::new(news_source, index, &config),
            analyzer: QuantAnalyzer::new(config.clamp_exposure),
            narrator: NarrativeGenerator::default(),
            portfolio: config.portfolio.clone(),
            fetcher,
            primary,
            config,
            stage: Stage::Idle,
        }
    }

    /// Yahoo Finance primary, Alpha Vantage secondary, live news scraping
    /// and an in-memory index
    pub fn from_config(config: BriefConfig) -> Result<Self> {
        let primary = Arc::new(YahooFinanceClient::new(config.trend_window)?);
        let secondary = Arc::new(AlphaVantageClient::from_config(&config)?);
        let scraper = Arc::new(HttpScraper::new(config.request_timeout)?);
        let index = Box::new(InMemoryIndex::new(news_embedder()));

        Ok(Self::new(config, primary, secondary, scraper, index))
    }

    /// Replace the portfolio weights used for exposure
    pub fn with_portfolio(mut self, portfolio: PortfolioWeights) -> Self {
        self.portfolio = portfolio;
        self
    }

    /// Stage reached by the most recent query
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Answer `query` with a markdown brief.
    ///
    /// `symbols` are caller-supplied tickers, merged with those found in the
    /// query text before validation.
    #[instrument(skip(self, symbols), fields(requested = symbols.len()))]
    pub async fn process_query(&mut self, query: &str, symbols: &[String]) -> String {
        self.stage = Stage::Idle;
        if query.trim().is_empty() {
            debug!("empty query");
            return NO_QUERY_RESPONSE.to_string();
        }

        let started_at = Utc::now();
        let response = match self.run(query, symbols).await {
            Ok(brief) => {
                self.advance(Stage::Done);
                brief.render()
            },
            Err(e) => {
                self.advance(Stage::Error);
                error!(error = %e, "query failed");
                ERROR_RESPONSE.to_string()
            },
        };

        let elapsed = Utc::now() - started_at;
        info!(elapsed_ms = elapsed.num_milliseconds(), stage = %self.stage, "query finished");
        response
    }

    async fn run(&mut self, query: &str, requested: &[String]) -> Result<Brief> {
        self.advance(Stage::ExtractSymbols);
        let symbols = self.resolve_symbols(query, requested).await;

        self.advance(Stage::FetchMarketData);
        let quotes = self.fetcher.fetch(&symbols).await;

        self.advance(Stage::FetchEarnings);
        let earnings = self.fetcher.fetch_all_earnings(&symbols).await;

        self.advance(Stage::ScrapeNews);
        let news_symbol = symbols
            .first()
            .cloned()
            .unwrap_or_else(|| self.extractor.default_symbol().to_string());
        let news_text = self.retriever.scrape(&news_symbol).await;

        self.advance(Stage::IndexAndRetrieve);
        let retrieved = self.retriever.index_and_retrieve(&news_text, query);
        debug!(chunks = retrieved.len(), "retrieved news context");

        self.advance(Stage::Analyze);
        check_weights(&self.portfolio)?;
        let exposure = self.analyzer.exposure(&quotes, &self.portfolio);
        let surprises = self.analyzer.earnings_surprises(&earnings);

        self.advance(Stage::Narrate);
        let context = retrieved.join(" ");
        let prediction = self.narrator.prediction(&quotes, &surprises, &symbols);
        let strategy = self.narrator.strategy(exposure, &context, &quotes, &symbols);

        self.advance(Stage::Format);
        let holdings = symbols
            .iter()
            .filter_map(|s| self.portfolio.get(s).map(|weight| (s.clone(), *weight)))
            .collect();
        let lines = symbols
            .iter()
            .map(|s| SymbolLine {
                symbol: s.clone(),
                quote: quotes.get(s).cloned().unwrap_or_default(),
                earnings_surprise: surprises.get(s).copied().unwrap_or_default(),
            })
            .collect();

        Ok(Brief {
            exposure,
            holdings,
            total_aum: self.portfolio.values().sum(),
            symbols: lines,
            market_context: truncate_context(&context, self.config.context_preview_chars),
            prediction,
            strategy,
        })
    }

    /// Caller symbols and query candidates, validated against the primary source
    async fn resolve_symbols(&self, query: &str, requested: &[String]) -> Vec<String> {
        let mut candidates: BTreeSet<String> = self.extractor.candidates(query);
        candidates.extend(
            requested
                .iter()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty()),
        );
        debug!(?candidates, "symbol candidates");

        let symbols = self
            .extractor
            .validate_candidates(candidates, self.primary.as_ref())
            .await;
        info!(?symbols, "symbols for query");
        symbols
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }
}

#[cfg(feature = "fastembed")]
fn news_embedder() -> Box<dyn Embedder> {
    match crate::news::FastEmbedder::new() {
        Ok(embedder) => Box::new(embedder),
        Err(e) => {
            tracing::warn!(error = %e, "falling back to hashing embeddings");
            Box::new(HashingEmbedder::default())
        },
    }
}

#[cfg(not(feature = "fastembed"))]
fn news_embedder() -> Box<dyn Embedder> {
    debug!("fastembed feature disabled, using hashing embeddings");
    Box::new(HashingEmbedder::default())
}
