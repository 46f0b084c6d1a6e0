//! Error types for admitbuddy.
//!
//! One crate-wide error enum with the per-request taxonomy: index and
//! reranker failures are fatal to the request and surfaced to the caller;
//! everything else is converted at the pipeline boundary.

use thiserror::Error;

/// Main error type for the assistant
#[derive(Error, Debug)]
pub enum AssistantError {
    /// The vector index could not be opened or searched
    #[error("Vector index unavailable: {reason}")]
    IndexUnavailable { reason: String },

    /// The cross-encoder scoring model failed to load
    #[error("Reranker unavailable: {0}")]
    RerankerUnavailable(String),

    /// Embedding model load or inference failure
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Answer generation (Ollama API) errors
    #[error("Generation error: {0}")]
    GenerationError(String),

    /// Document ingestion errors
    #[error("Ingest error: {0}")]
    IngestError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Assistant error: {0}")]
    Generic(String),
}

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Convert anyhow errors to AssistantError
impl From<anyhow::Error> for AssistantError {
    fn from(err: anyhow::Error) -> Self {
        AssistantError::Generic(err.to_string())
    }
}
