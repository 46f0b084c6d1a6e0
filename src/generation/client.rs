//! Ollama API client for answer generation
//!
//! The pipeline treats generation as a black-box completion service; this
//! client streams tokens from POST /api/generate and never inspects or
//! validates the generated answer.

use crate::errors::{AssistantError, Result};
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout; generation on CPU models can be slow
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama generation client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(AssistantError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }

    /// Stream a completion, invoking `on_token` for each token as it arrives.
    /// Returns the full accumulated answer.
    pub async fn generate_streaming<F>(&self, prompt: String, mut on_token: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt,
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistantError::GenerationError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssistantError::GenerationError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let mut answer = String::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result
                .map_err(|e| AssistantError::GenerationError(format!("Stream error: {}", e)))?;

            // Each line of the stream is one JSON chunk
            for line in bytes.split(|b| *b == b'\n') {
                if line.is_empty() {
                    continue;
                }
                if let Ok(chunk) = serde_json::from_slice::<GenerateChunk>(line) {
                    if !chunk.response.is_empty() {
                        on_token(&chunk.response);
                        answer.push_str(&chunk.response);
                    }
                    if chunk.done {
                        return Ok(answer);
                    }
                }
            }
        }

        Ok(answer)
    }

    /// Generate a complete answer without streaming callbacks
    pub async fn generate(&self, prompt: String) -> Result<String> {
        self.generate_streaming(prompt, |_| {}).await
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Check if the configured model is installed
    pub async fn model_available(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AssistantError::GenerationError(format!("Failed to query models: {}", e)))?;

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::GenerationError(format!("Failed to parse response: {}", e)))?;

        Ok(tags.models.iter().any(|m| m.name == self.model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new("http://127.0.0.1:11434", "qwen2.5:7b-instruct").unwrap();
        assert_eq!(client.model(), "qwen2.5:7b-instruct");
    }

    #[test]
    fn test_generate_request_serialization() {
        let request = GenerateRequest {
            model: "qwen2.5:7b-instruct".to_string(),
            prompt: "Hello".to_string(),
            stream: true,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"stream\":true"));
        assert!(json.contains("qwen2.5:7b-instruct"));
    }

    #[test]
    fn test_chunk_deserialization_defaults() {
        let chunk: GenerateChunk = serde_json::from_str("{\"response\":\"hi\"}").unwrap();
        assert_eq!(chunk.response, "hi");
        assert!(!chunk.done);
    }
}
