// End-to-end context-assembly pipeline
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::Result;
use crate::rag::context::{ContextAssembler, PipelineResult};
use crate::rag::guardrail::GuardrailClassifier;
use crate::rag::rerank::{RelevanceScorer, Reranker};
use crate::rag::retrieval::PassageSource;
use crate::rag::temporal::TemporalFilter;

/// Per-invocation pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Candidates fetched from the vector index
    pub retrieve_k: usize,
    /// Passages kept after reranking
    pub top_k: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            retrieve_k: 20,
            top_k: 5,
        }
    }
}

/// Retrieve -> temporal filter -> rerank -> guardrail -> assemble.
///
/// Each stage consumes the previous stage's full output and may only shrink
/// it; the reranker is the only stage that reorders, and it rescores
/// everything it reorders. Stage handles are loaded once at startup and
/// shared read-only, so concurrent invocations need no locking.
pub struct AnswerPipeline {
    source: Arc<dyn PassageSource>,
    temporal: TemporalFilter,
    reranker: Reranker,
    guardrail: GuardrailClassifier,
    assembler: ContextAssembler,
}

impl AnswerPipeline {
    pub fn new(
        source: Arc<dyn PassageSource>,
        scorer: Arc<dyn RelevanceScorer>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            source,
            temporal: TemporalFilter::new(),
            reranker: Reranker::new(scorer),
            guardrail: GuardrailClassifier::new(contact_email),
            assembler: ContextAssembler::new(),
        }
    }

    /// Run the pipeline for one question.
    ///
    /// The reranker sees the full temporal-filter survivor set, not just
    /// the final top-k; truncation happens after cross-encoder scoring.
    pub async fn run(
        &self,
        query: &str,
        reference_date: NaiveDate,
        params: &PipelineParams,
    ) -> Result<PipelineResult> {
        let retrieved = self.source.search(query, params.retrieve_k).await?;

        let current = self.temporal.filter(retrieved, reference_date);

        let ranked = self.reranker.rerank(query, current, params.top_k);

        let verdict = self.guardrail.classify(query, &ranked);

        Ok(self.assembler.assemble(ranked, verdict))
    }
}
