// Context-assembly pipeline
//
// Turns a user question plus the document corpus into a bounded, cited
// context block for answer generation.
//
// Stages, in order:
// - Retrieval: top-k candidates from the vector index
// - Temporal filter: drop passages mentioning elapsed dates
// - Rerank: cross-encoder second pass, keep the best top-k
// - Guardrail: sensitive-topic gate (pass / warn / abstain)
// - Context: concatenate survivors, record provenance

pub mod retrieval;
pub mod temporal;
pub mod rerank;
pub mod guardrail;
pub mod context;
pub mod pipeline;

// Re-export key types
pub use context::{ContextAssembler, PipelineResult};
pub use guardrail::{GuardrailClassifier, GuardrailVerdict};
pub use pipeline::{AnswerPipeline, PipelineParams};
pub use rerank::{CrossEncoder, RelevanceScorer, Reranker};
pub use retrieval::{Passage, PassageSource, QdrantRetriever};
pub use temporal::TemporalFilter;
