// Second-pass relevance scoring with a cross-encoder
use anyhow::Context;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config, XLMRobertaForSequenceClassification};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::errors::{AssistantError, Result};
use crate::rag::retrieval::Passage;

const DEFAULT_MODEL_ID: &str = "BAAI/bge-reranker-base";

/// Scores a (query, passage) pair for relevance.
///
/// Separated from the rerank stage so tests can substitute deterministic
/// scorers for the model.
pub trait RelevanceScorer: Send + Sync {
    fn score(&self, query: &str, text: &str) -> Result<f32>;
}

/// Cross-encoder over query/passage pairs, one relevance logit per pair.
///
/// First-stage vector similarity is a cheap recall mechanism; this is the
/// higher-precision second pass that corrects its ranking errors.
pub struct CrossEncoder {
    model: XLMRobertaForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
}

impl CrossEncoder {
    /// Load the default reranker model (downloads on first use)
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL_ID)
    }

    /// Load a specific reranker model from the HuggingFace Hub
    pub fn with_model(model_id: &str) -> Result<Self> {
        Self::load(model_id).map_err(|e| AssistantError::RerankerUnavailable(e.to_string()))
    }

    fn load(model_id: &str) -> anyhow::Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download reranker config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download reranker tokenizer")?;
        let weights_path = repo.get("model.safetensors")
            .context("Failed to download reranker weights")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read reranker config")?;
        let config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse reranker config")?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load reranker tokenizer: {}", e))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load reranker weights")?
        };

        let model = XLMRobertaForSequenceClassification::new(1, &config, vb)
            .context("Failed to build reranker model")?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }
}

impl RelevanceScorer for CrossEncoder {
    fn score(&self, query: &str, text: &str) -> Result<f32> {
        let encoding = self
            .tokenizer
            .encode((query, text), true)
            .map_err(|e| AssistantError::Generic(format!("Pair tokenization failed: {}", e)))?;

        let ids = encoding.get_ids();
        let mask = encoding.get_attention_mask();
        let len = ids.len();

        let score = (|| -> candle_core::Result<f32> {
            let input_ids = Tensor::from_vec(ids.to_vec(), (1, len), &self.device)?;
            let attention_mask = Tensor::from_vec(mask.to_vec(), (1, len), &self.device)?;
            let token_type_ids = input_ids.zeros_like()?;

            let logits = self
                .model
                .forward(&input_ids, &attention_mask, &token_type_ids)?;

            logits.squeeze(1)?.squeeze(0)?.to_scalar::<f32>()
        })()
        .map_err(|e| AssistantError::Generic(format!("Reranker inference failed: {}", e)))?;

        Ok(score)
    }
}

/// Rerank stage: score every passage against the query, sort descending,
/// keep the top `top_k`.
pub struct Reranker {
    scorer: Arc<dyn RelevanceScorer>,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { scorer }
    }

    /// Score and reorder passages; equal scores keep their input order.
    ///
    /// A passage whose scoring fails is floored to the lowest possible
    /// score instead of failing the whole batch.
    pub fn rerank(&self, query: &str, passages: Vec<Passage>, top_k: usize) -> Vec<Passage> {
        if passages.is_empty() {
            return passages;
        }

        let mut scored: Vec<Passage> = passages
            .into_iter()
            .map(|mut passage| {
                let score = self
                    .scorer
                    .score(query, &passage.content)
                    .unwrap_or(f32::NEG_INFINITY);
                passage.score = Some(score);
                passage
            })
            .collect();

        // Stable sort: ties retain relative input order
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scored.truncate(top_k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scores by the number position embedded in the passage text
    struct KeywordScorer;

    impl RelevanceScorer for KeywordScorer {
        fn score(&self, query: &str, text: &str) -> Result<f32> {
            if text.contains("fail") {
                return Err(AssistantError::Generic("bad pair".to_string()));
            }
            let overlap = query
                .split_whitespace()
                .filter(|word| text.contains(*word))
                .count();
            Ok(overlap as f32)
        }
    }

    /// Returns the same score for every passage
    struct ConstantScorer(f32);

    impl RelevanceScorer for ConstantScorer {
        fn score(&self, _query: &str, _text: &str) -> Result<f32> {
            Ok(self.0)
        }
    }

    fn passage(content: &str) -> Passage {
        Passage {
            content: content.to_string(),
            source_id: "test".to_string(),
            score: None,
        }
    }

    #[test]
    fn test_rerank_sorts_descending() {
        let reranker = Reranker::new(Arc::new(KeywordScorer));
        let passages = vec![
            passage("nothing relevant here"),
            passage("deadline tuition gpa"),
            passage("deadline only"),
        ];

        let ranked = reranker.rerank("deadline tuition gpa", passages, 3);
        assert_eq!(ranked[0].content, "deadline tuition gpa");
        assert_eq!(ranked[1].content, "deadline only");
        assert_eq!(ranked[0].score, Some(3.0));
    }

    #[test]
    fn test_rerank_truncates_to_top_k() {
        let reranker = Reranker::new(Arc::new(ConstantScorer(1.0)));
        let passages = (0..6).map(|i| passage(&format!("passage {}", i))).collect();

        let ranked = reranker.rerank("query", passages, 2);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_rerank_ties_are_stable() {
        let reranker = Reranker::new(Arc::new(ConstantScorer(0.5)));
        let passages = vec![passage("first"), passage("second"), passage("third")];

        let ranked = reranker.rerank("query", passages, 3);
        assert_eq!(ranked[0].content, "first");
        assert_eq!(ranked[1].content, "second");
        assert_eq!(ranked[2].content, "third");
    }

    #[test]
    fn test_rerank_fewer_than_top_k_returns_all() {
        let reranker = Reranker::new(Arc::new(ConstantScorer(0.5)));
        let ranked = reranker.rerank("query", vec![passage("only one")], 5);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_rerank_empty_input() {
        let reranker = Reranker::new(Arc::new(ConstantScorer(0.5)));
        let ranked = reranker.rerank("query", Vec::new(), 5);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_scoring_failure_floors_passage() {
        let reranker = Reranker::new(Arc::new(KeywordScorer));
        let passages = vec![passage("fail this one"), passage("deadline info")];

        let ranked = reranker.rerank("deadline", passages, 2);
        // The failing passage sinks to the bottom instead of aborting the batch
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].content, "deadline info");
        assert_eq!(ranked[1].score, Some(f32::NEG_INFINITY));
    }
}
