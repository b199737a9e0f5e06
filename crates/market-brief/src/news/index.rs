//! Embedding and similarity search over the current batch of news chunks

use crate::error::{BriefError, Result};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default dimension of [`HashingEmbedder`] vectors
pub const DEFAULT_DIMENSION: usize = 384;

/// Turns texts into fixed-size vectors
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text]).map(|mut v| v.pop().unwrap_or_default())
    }
}

/// Bag-of-words embedder: lower-cased alphanumeric tokens hashed into a
/// fixed number of buckets, then L2-normalised.
///
/// Needs no model download, so it serves offline runs and tests and is the
/// fallback when a neural embedder cannot be loaded.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];

        for token in tokens(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Compute cosine similarity between two vectors.
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// A searchable collection of text chunks
#[cfg_attr(test, mockall::automock)]
pub trait NewsIndex: Send + Sync {
    /// Replace the indexed content with `chunks`
    fn index(&mut self, chunks: Vec<String>) -> Result<()>;

    /// At most `k` chunks, most similar to `query` first
    fn search(&self, query: &str, k: usize) -> Result<Vec<String>>;

    /// Number of indexed chunks
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force cosine index held in memory
pub struct InMemoryIndex {
    embedder: Box<dyn Embedder>,
    entries: Vec<(String, Vec<f32>)>,
}

impl InMemoryIndex {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new(Box::new(HashingEmbedder::default()))
    }
}

impl NewsIndex for InMemoryIndex {
    fn index(&mut self, chunks: Vec<String>) -> Result<()> {
        self.entries.clear();
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let vectors = self.embedder.embed(&texts)?;
        if vectors.len() != chunks.len() {
            return Err(BriefError::Index(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimension = self.embedder.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(BriefError::Index(format!(
                "embedder returned a {}-dimensional vector, expected {dimension}",
                bad.len()
            )));
        }

        self.entries = chunks.into_iter().zip(vectors).collect();
        Ok(())
    }

    fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_one(query)?;

        let mut scored: Vec<(f32, &str)> = self
            .entries
            .iter()
            .map(|(text, vector)| (cosine_similarity(&query_vector, vector), text.as_str()))
            .collect();
        // Stable sort keeps document order among equal scores.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, text)| text.to_string())
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Err(BriefError::Index("model not loaded".to_string()))
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    /// Claims one dimension but returns another
    struct MisreportingEmbedder;

    impl Embedder for MisreportingEmbedder {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0; 3]).collect())
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    fn chunks() -> Vec<String> {
        vec![
            "Apple unveils a new phone lineup".to_string(),
            "TSMC expands AI chip capacity amid strong demand".to_string(),
            "Oil prices slide on weak demand".to_string(),
        ]
    }

    #[test]
    fn test_hashing_embedder_is_normalised() {
        let embedder = HashingEmbedder::new(64);
        let vector = embedder.embed_one("AI chip demand").unwrap();
        assert_eq!(vector.len(), embedder.dimension());
        assert_eq!(HashingEmbedder::new(0).dimension(), 1);

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_embedder_empty_text() {
        let vector = HashingEmbedder::new(8).embed_one("").unwrap();
        assert!(vector.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let mut index = InMemoryIndex::default();
        index.index(chunks()).unwrap();
        assert_eq!(index.len(), 3);

        let results = index.search("TSMC AI chip capacity", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], "TSMC expands AI chip capacity amid strong demand");
    }

    #[test]
    fn test_search_returns_at_most_k() {
        let mut index = InMemoryIndex::default();
        index.index(chunks()).unwrap();
        assert_eq!(index.search("demand", 5).unwrap().len(), 3);
        assert!(index.search("demand", 0).unwrap().is_empty());
    }

    #[test]
    fn test_index_replaces_previous_batch() {
        let mut index = InMemoryIndex::default();
        index.index(chunks()).unwrap();
        index.index(vec!["Only this chunk remains".to_string()]).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.search("chunk", 5).unwrap(),
            vec!["Only this chunk remains".to_string()]
        );
    }

    #[test]
    fn test_empty_index_search() {
        let mut index = InMemoryIndex::default();
        index.index(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert!(index.search("anything", 5).unwrap().is_empty());
    }

    #[test]
    fn test_embedder_failure_propagates() {
        let mut index = InMemoryIndex::new(Box::new(FailingEmbedder));
        assert!(matches!(index.index(chunks()), Err(BriefError::Index(_))));
        assert!(index.is_empty());
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mut index = InMemoryIndex::new(Box::new(MisreportingEmbedder));
        let err = index.index(chunks()).unwrap_err();
        assert!(err.to_string().contains("expected 8"));
        assert!(index.is_empty());
    }
}
