//! Bootstrap checks for admitbuddy
//!
//! Verifies the two external services (Qdrant index, Ollama generator) are
//! reachable and populated before a question is attempted.

use std::sync::Arc;

use crate::errors::Result;
use crate::generation::OllamaClient;
use crate::store::VectorStore;

/// Bootstrap check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    Ready,
    QdrantNotRunning,
    IndexEmpty(String),
    OllamaNotRunning,
    ModelNotAvailable(String),
}

/// Service detector and setup guide
pub struct Bootstrap {
    store: Arc<VectorStore>,
    generator: OllamaClient,
}

impl Bootstrap {
    pub fn new(store: Arc<VectorStore>, generator: OllamaClient) -> Self {
        Self { store, generator }
    }

    /// Run the full readiness check, stopping at the first failure
    pub async fn check(&self) -> Result<BootstrapStatus> {
        if !self.store.is_reachable().await {
            return Ok(BootstrapStatus::QdrantNotRunning);
        }

        let indexed = self.store.count().await.unwrap_or(0);
        if indexed == 0 {
            return Ok(BootstrapStatus::IndexEmpty(
                self.store.collection().to_string(),
            ));
        }

        if !self.generator.health_check().await {
            return Ok(BootstrapStatus::OllamaNotRunning);
        }

        if !self.generator.model_available().await.unwrap_or(false) {
            return Ok(BootstrapStatus::ModelNotAvailable(
                self.generator.model().to_string(),
            ));
        }

        Ok(BootstrapStatus::Ready)
    }

    /// Display setup instructions for Qdrant
    pub fn show_qdrant_instructions() {
        eprintln!("\nQdrant not found or not running!");
        eprintln!("\nThe vector index is served by a local Qdrant instance.");
        eprintln!("\nStart Qdrant:");
        eprintln!("   docker run -p 6333:6333 -p 6334:6334 qdrant/qdrant");
        eprintln!("\nMore info: https://qdrant.tech/documentation/quickstart/");
        eprintln!();
    }

    /// Display instructions for an empty index
    pub fn show_ingest_instructions(collection: &str) {
        eprintln!("\nThe '{}' collection is empty!", collection);
        eprintln!("\nIngest the program documents first:");
        eprintln!("   admitbuddy ingest <documents-dir>");
        eprintln!();
    }

    /// Display installation instructions for Ollama
    pub fn show_ollama_instructions() {
        eprintln!("\nOllama not found or not running!");
        eprintln!("\nOllama generates the answers from the assembled context.");
        eprintln!("\nInstallation:");
        eprintln!("   Linux:   curl -fsSL https://ollama.com/install.sh | sh");
        eprintln!("   macOS:   brew install ollama");
        eprintln!("\nStart Ollama:");
        eprintln!("   ollama serve");
        eprintln!();
    }

    /// Display instructions for pulling the generation model
    pub fn show_model_pull_instructions(model_tag: &str) {
        eprintln!("\nModel '{}' not found!", model_tag);
        eprintln!("\nTo download this model, run:");
        eprintln!("   ollama pull {}", model_tag);
        eprintln!();
    }
}

/// Exit code for setup needed
pub const EXIT_CODE_SETUP_NEEDED: i32 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_status_equality() {
        assert_eq!(BootstrapStatus::Ready, BootstrapStatus::Ready);
        assert_eq!(
            BootstrapStatus::IndexEmpty("program_docs".to_string()),
            BootstrapStatus::IndexEmpty("program_docs".to_string())
        );
        assert_ne!(
            BootstrapStatus::QdrantNotRunning,
            BootstrapStatus::OllamaNotRunning
        );
    }

    #[test]
    fn test_exit_code_constant() {
        assert_eq!(EXIT_CODE_SETUP_NEEDED, 2);
    }
}
