// Final context assembly with provenance
use serde::{Deserialize, Serialize};

use crate::rag::guardrail::GuardrailVerdict;
use crate::rag::retrieval::Passage;

/// The sole output handed to the answer generator and the UI layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Bounded context block for the generator; empty on abstain
    pub context: String,
    /// Source identifiers of the contributing passages, in context order
    pub sources: Vec<String>,
    /// Guardrail outcome for this query
    pub verdict: GuardrailVerdict,
}

impl PipelineResult {
    pub fn has_context(&self) -> bool {
        !self.context.is_empty()
    }
}

/// Concatenates surviving passages into the context block.
///
/// On an abstain verdict no passage content is forwarded downstream - the
/// result carries only the advisory.
pub struct ContextAssembler;

impl ContextAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(&self, passages: Vec<Passage>, verdict: GuardrailVerdict) -> PipelineResult {
        if verdict.is_abstain() {
            return PipelineResult {
                context: String::new(),
                sources: Vec::new(),
                verdict,
            };
        }

        let context = passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let sources = passages.into_iter().map(|p| p.source_id).collect();

        PipelineResult {
            context,
            sources,
            verdict,
        }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(content: &str, source: &str) -> Passage {
        Passage {
            content: content.to_string(),
            source_id: source.to_string(),
            score: Some(0.5),
        }
    }

    #[test]
    fn test_assemble_joins_with_double_break() {
        let assembler = ContextAssembler::new();
        let result = assembler.assemble(
            vec![passage("First passage.", "a.txt"), passage("Second passage.", "b.txt")],
            GuardrailVerdict::Pass,
        );

        assert_eq!(result.context, "First passage.\n\nSecond passage.");
        assert_eq!(result.sources, vec!["a.txt", "b.txt"]);
        assert!(result.has_context());
    }

    #[test]
    fn test_abstain_forwards_nothing() {
        let assembler = ContextAssembler::new();
        let verdict = GuardrailVerdict::Abstain {
            advisory: "Contact admissions.".to_string(),
        };

        let result = assembler.assemble(vec![passage("Hidden.", "a.txt")], verdict);

        assert!(result.context.is_empty());
        assert!(result.sources.is_empty());
        assert_eq!(result.verdict.advisory(), Some("Contact admissions."));
    }

    #[test]
    fn test_warn_keeps_content_and_advisory() {
        let assembler = ContextAssembler::new();
        let verdict = GuardrailVerdict::Warn {
            advisory: "Confirm with admissions.".to_string(),
        };

        let result = assembler.assemble(vec![passage("Tuition details.", "fees.txt")], verdict);

        // The assembler attaches the advisory but never alters passage content
        assert_eq!(result.context, "Tuition details.");
        assert_eq!(result.verdict.advisory(), Some("Confirm with admissions."));
    }

    #[test]
    fn test_empty_passages_yield_empty_context() {
        let assembler = ContextAssembler::new();
        let result = assembler.assemble(Vec::new(), GuardrailVerdict::Pass);
        assert_eq!(result.context, "");
        assert!(result.sources.is_empty());
        assert!(!result.has_context());
    }
}
