//! Scrape, index and retrieve news context for one query

use crate::config::BriefConfig;
use crate::error::Result;
use crate::news::{NewsIndex, NewsSource, TextSplitter};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Owns the long-lived scraper and index handles.
///
/// [`NewsRetriever::index_and_retrieve`] rebuilds the index before every read.
/// Scrape and index failures both degrade to "no context".
pub struct NewsRetriever {
    source: Arc<dyn NewsSource>,
    index: Box<dyn NewsIndex>,
    splitter: TextSplitter,
    config: BriefConfig,
}

impl NewsRetriever {
    pub fn new(
        source: Arc<dyn NewsSource>,
        index: Box<dyn NewsIndex>,
        config: &BriefConfig,
    ) -> Self {
        Self {
            source,
            index,
            splitter: TextSplitter::new(config.chunk_size, config.chunk_overlap),
            config: config.clone(),
        }
    }

    /// Raw page text for `symbol`; empty when the page could not be fetched
    pub async fn scrape(&self, symbol: &str) -> String {
        let url = self.config.news_url(symbol);
        let text = self.source.fetch_text(&url).await;
        if text.is_empty() {
            info!(symbol, url = %url, "no news text scraped");
        }
        text
    }

    /// Index `text` from scratch and return the top chunks for `query`, most
    /// relevant first. An index or embedding failure is logged and yields no
    /// chunks.
    pub fn index_and_retrieve(&mut self, text: &str, query: &str) -> Vec<String> {
        match self.try_index_and_retrieve(text, query) {
            Ok(chunks) => chunks,
            Err(e) => {
                error!(error = %e, "news retrieval failed, continuing without context");
                Vec::new()
            },
        }
    }

    fn try_index_and_retrieve(&mut self, text: &str, query: &str) -> Result<Vec<String>> {
        let chunks = self.splitter.split(text);
        debug!(chunks = chunks.len(), "indexing news chunks");

        self.index.index(chunks)?;
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        self.index.search(query, self.config.top_k)
    }
}
