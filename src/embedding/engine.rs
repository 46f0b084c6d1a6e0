// Sentence embedding engine - MiniLM via Candle
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::Tokenizer;

const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
const EMBEDDING_DIM: usize = 384;

/// Embedding engine producing 384-dim normalized sentence vectors
pub struct EmbeddingEngine {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl EmbeddingEngine {
    /// Load the default embedding model (downloads on first use)
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL_ID)
    }

    /// Load a specific sentence-transformer model from the HuggingFace Hub
    pub fn with_model(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download embedding model config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download embedding tokenizer")?;
        let weights_path = repo.get("model.safetensors")
            .context("Failed to download embedding model weights")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read embedding model config")?;
        let config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse embedding model config")?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load embedding model weights")?
        };

        let model = BertModel::load(vb, &config)
            .context("Failed to build embedding model")?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Embed a single text
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text])?;
        batch.pop().context("Embedding batch returned no vectors")
    }

    /// Embed multiple texts in one forward pass
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self.tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let batch_size = texts.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Pad token ids and attention masks to the longest sequence
        let mut flat_ids = vec![0u32; batch_size * max_len];
        let mut flat_mask = vec![0u32; batch_size * max_len];

        for (row, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            flat_ids[row * max_len..row * max_len + ids.len()].copy_from_slice(ids);
            flat_mask[row * max_len..row * max_len + mask.len()].copy_from_slice(mask);
        }

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = Self::mean_pool(&hidden, &attention_mask)?;
        let normalized = Self::l2_normalize(&pooled)?;

        Ok(normalized.to_vec2::<f32>()?)
    }

    /// Mean pooling over the sequence dimension, masked by attention
    fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = attention_mask
            .unsqueeze(2)?
            .expand(hidden.shape())?
            .to_dtype(hidden.dtype())?;

        let summed = (hidden * &mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(summed.broadcast_div(&counts)?)
    }

    /// L2-normalize each row; cosine similarity in the index expects unit vectors
    fn l2_normalize(embeddings: &Tensor) -> Result<Tensor> {
        let norms = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?;
        Ok(embeddings.broadcast_div(&norms)?)
    }

    /// Embedding dimension (384 for MiniLM-L6)
    pub fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_embedding_dimension() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        assert_eq!(engine.dimension(), 384);
    }

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_embed_is_normalized() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        let embedding = engine.embed("When is the application deadline?").expect("Failed to embed");
        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_embed_empty_batch() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        let embeddings = engine.embed_batch(&[]).expect("Failed to embed empty batch");
        assert!(embeddings.is_empty());
    }
}
