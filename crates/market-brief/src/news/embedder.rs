//! Neural sentence embeddings via fastembed
//!
//! Model weights are downloaded on first use and cached by fastembed.

use super::index::Embedder;
use crate::error::{BriefError, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// Local ONNX sentence embedder
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    dimension: usize,
}

impl FastEmbedder {
    /// all-MiniLM-L6-v2, 384 dimensions
    pub fn new() -> Result<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2)
    }

    pub fn with_model(model_name: EmbeddingModel) -> Result<Self> {
        let dimension = embedding_dimension(&model_name)?;
        let model =
            TextEmbedding::try_new(InitOptions::new(model_name).with_show_download_progress(true))
                .map_err(|e| BriefError::Index(format!("failed to load embedding model: {e}")))?;

        Ok(Self {
            model: Mutex::new(model),
            dimension,
        })
    }
}

impl Embedder for FastEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| BriefError::Index("embedding model lock poisoned".to_string()))?;
        model
            .embed(texts, None)
            .map_err(|e| BriefError::Index(format!("embedding failed: {e}")))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn embedding_dimension(model: &EmbeddingModel) -> Result<usize> {
    match model {
        EmbeddingModel::AllMiniLML6V2 | EmbeddingModel::AllMiniLML12V2 => Ok(384),
        EmbeddingModel::BGESmallENV15 => Ok(384),
        EmbeddingModel::BGEBaseENV15 => Ok(768),
        EmbeddingModel::BGELargeENV15 => Ok(1024),
        other => Err(BriefError::Config(format!(
            "unsupported embedding model: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::{InMemoryIndex, NewsIndex};

    #[test]
    fn test_embedding_dimension() {
        assert_eq!(embedding_dimension(&EmbeddingModel::AllMiniLML6V2).unwrap(), 384);
        assert_eq!(embedding_dimension(&EmbeddingModel::BGEBaseENV15).unwrap(), 768);
    }

    #[test]
    #[ignore = "downloads model weights"]
    fn test_fast_embedder_ranks_related_chunk_first() {
        let embedder = FastEmbedder::new().unwrap();
        let mut index = InMemoryIndex::new(Box::new(embedder));
        index
            .index(vec![
                "Oil prices slide on weak demand".to_string(),
                "TSMC expands AI chip capacity".to_string(),
            ])
            .unwrap();

        let results = index.search("semiconductor manufacturing", 1).unwrap();
        assert_eq!(results, vec!["TSMC expands AI chip capacity".to_string()]);
    }
}
