// Local sentence embeddings for query and document encoding
pub mod engine;

pub use engine::EmbeddingEngine;
