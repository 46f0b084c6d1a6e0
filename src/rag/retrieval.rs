// First-stage candidate retrieval from the vector index
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::embedding::EmbeddingEngine;
use crate::errors::{AssistantError, Result};
use crate::store::{ScoredChunk, VectorStore};

/// A retrieved unit of document text with provenance.
///
/// Content and source never change after retrieval; only the score is
/// overwritten as the passage moves through scoring stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    pub source_id: String,
    pub score: Option<f32>,
}

impl From<ScoredChunk> for Passage {
    fn from(chunk: ScoredChunk) -> Self {
        Self {
            content: chunk.text,
            source_id: chunk.source,
            score: Some(chunk.score),
        }
    }
}

/// Source of candidate passages for a query.
///
/// The production implementation embeds the query and searches Qdrant;
/// tests substitute fixed passage sets.
#[async_trait]
pub trait PassageSource: Send + Sync {
    /// Return up to `k` passages in descending similarity order
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>>;
}

/// Retriever over the persistent Qdrant index
pub struct QdrantRetriever {
    embedder: Arc<EmbeddingEngine>,
    store: Arc<VectorStore>,
}

impl QdrantRetriever {
    pub fn new(embedder: Arc<EmbeddingEngine>, store: Arc<VectorStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl PassageSource for QdrantRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        // An unreachable index is fatal to the request; an empty one is not
        let indexed = self
            .store
            .count()
            .await
            .map_err(|e| AssistantError::IndexUnavailable {
                reason: e.to_string(),
            })?;

        if indexed == 0 {
            return Ok(Vec::new());
        }

        let embedding = self
            .embedder
            .embed(query)
            .map_err(|e| AssistantError::EmbeddingError(e.to_string()))?;

        let chunks = self
            .store
            .search(&embedding, k)
            .await
            .map_err(|e| AssistantError::IndexUnavailable {
                reason: e.to_string(),
            })?;

        Ok(chunks.into_iter().map(Passage::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passage_from_scored_chunk() {
        let chunk = ScoredChunk {
            text: "Applications open in September.".to_string(),
            source: "https://example.edu/apply".to_string(),
            score: 0.87,
        };

        let passage = Passage::from(chunk);
        assert_eq!(passage.content, "Applications open in September.");
        assert_eq!(passage.source_id, "https://example.edu/apply");
        assert_eq!(passage.score, Some(0.87));
    }
}
