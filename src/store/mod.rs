// Persistent vector index access (Qdrant)
pub mod qdrant;

pub use qdrant::{ScoredChunk, VectorStore};
