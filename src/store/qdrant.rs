// Qdrant-backed vector store for the program document corpus
use anyhow::{Context, Result};
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        vectors_config::Config, with_payload_selector::SelectorOptions, CreateCollection,
        Distance, PointStruct, SearchPoints, Value as QdrantValue, VectorParams, VectorsConfig,
        WithPayloadSelector,
    },
};
use std::collections::HashMap;

const VECTOR_DIM: u64 = 384;

/// A scored chunk of document text returned by similarity search
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// A chunk of document text ready to be indexed
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub source: String,
    pub embedding: Vec<f32>,
}

/// Read access (and ingest-time write access) to the program corpus index
pub struct VectorStore {
    client: QdrantClient,
    collection: String,
}

impl VectorStore {
    /// Connect to a Qdrant instance
    pub fn connect(url: &str, collection: &str) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .context("Failed to create Qdrant client")?;

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }

    /// Create the collection if it does not exist (cosine distance, 384-dim)
    pub async fn ensure_collection(&self) -> Result<()> {
        let collections = self.client.list_collections().await?;
        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(&CreateCollection {
                    collection_name: self.collection.clone(),
                    vectors_config: Some(VectorsConfig {
                        config: Some(Config::Params(VectorParams {
                            size: VECTOR_DIM,
                            distance: Distance::Cosine.into(),
                            ..Default::default()
                        })),
                    }),
                    ..Default::default()
                })
                .await
                .context(format!("Failed to create collection: {}", self.collection))?;
        }

        Ok(())
    }

    /// Upsert a batch of embedded chunks
    pub async fn upsert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = chunks
            .into_iter()
            .map(|chunk| {
                let mut payload: HashMap<String, QdrantValue> = HashMap::new();
                payload.insert("text".to_string(), QdrantValue::from(chunk.text));
                payload.insert("source".to_string(), QdrantValue::from(chunk.source));
                PointStruct::new(chunk.id, chunk.embedding, payload)
            })
            .collect();

        self.client
            .upsert_points_blocking(&self.collection, None, points, None)
            .await
            .context("Failed to upsert chunks")?;

        Ok(())
    }

    /// Similarity search, descending score order
    pub async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        let search_result = self.client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector: query_embedding.to_vec(),
                limit: limit as u64,
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                ..Default::default()
            })
            .await
            .context("Failed to search collection")?;

        let chunks = search_result
            .result
            .into_iter()
            .map(|point| {
                let text = point
                    .payload
                    .get("text")
                    .and_then(payload_string)
                    .unwrap_or_default();
                let source = point
                    .payload
                    .get("source")
                    .and_then(payload_string)
                    .unwrap_or_else(|| "unknown".to_string());

                ScoredChunk {
                    text,
                    source,
                    score: point.score,
                }
            })
            .collect();

        Ok(chunks)
    }

    /// Number of indexed chunks
    pub async fn count(&self) -> Result<u64> {
        let info = self.client
            .collection_info(&self.collection)
            .await
            .context("Failed to get collection info")?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }

    /// True if the Qdrant instance answers health checks
    pub async fn is_reachable(&self) -> bool {
        self.client.health_check().await.is_ok()
    }

    /// Collection name this store reads from
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

fn payload_string(value: &QdrantValue) -> Option<String> {
    use qdrant_client::qdrant::value::Kind;
    value.kind.as_ref().and_then(|kind| match kind {
        Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> VectorStore {
        VectorStore::connect("http://localhost:6334", "test_docs").unwrap()
    }

    #[test]
    fn test_connect_builds_client() {
        let store = test_store();
        assert_eq!(store.collection(), "test_docs");
    }

    #[tokio::test]
    #[ignore] // Integration test - requires Qdrant
    async fn test_ensure_collection_idempotent() {
        let store = test_store();
        store.ensure_collection().await.unwrap();
        store.ensure_collection().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Integration test - requires Qdrant
    async fn test_upsert_and_search() {
        let store = test_store();
        store.ensure_collection().await.unwrap();

        let chunk = ChunkRecord {
            id: uuid::Uuid::new_v4().to_string(),
            text: "The program requires a bachelor's degree.".to_string(),
            source: "requirements.txt".to_string(),
            embedding: vec![0.05; 384],
        };
        store.upsert_chunks(vec![chunk]).await.unwrap();

        let results = store.search(&vec![0.05; 384], 5).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].source, "requirements.txt");
    }
}
