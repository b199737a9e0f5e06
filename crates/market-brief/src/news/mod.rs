//! News retrieval: scrape a page, split it, embed it, search it
//!
//! The index is rebuilt from freshly scraped text on every query; nothing is
//! carried over between queries. With the `fastembed` feature the index uses
//! a local neural embedder; otherwise, or when the model cannot be loaded, it
//! falls back to [`HashingEmbedder`].

#[cfg(feature = "fastembed")]
pub mod embedder;
pub mod index;
pub mod retriever;
pub mod scraper;
pub mod splitter;

#[cfg(feature = "fastembed")]
pub use embedder::FastEmbedder;
pub use index::{Embedder, HashingEmbedder, InMemoryIndex, NewsIndex};
pub use retriever::NewsRetriever;
pub use scraper::{HttpScraper, NewsSource};
pub use splitter::TextSplitter;

#[cfg(test)]
pub use index::MockNewsIndex;
#[cfg(test)]
pub use scraper::MockNewsSource;
