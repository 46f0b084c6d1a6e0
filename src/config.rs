use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub qdrant: QdrantConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub guardrail: GuardrailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub embedding: String,
    pub reranker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Candidates fetched from the vector index
    pub retrieve_k: usize,
    /// Passages kept after reranking
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailConfig {
    pub contact_email: String,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        QdrantConfig {
            url: "http://localhost:6334".to_string(),
            collection: "program_docs".to_string(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfig {
            host: "127.0.0.1".to_string(),
            port: 11434,
            model: "qwen2.5:7b-instruct".to_string(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        ModelsConfig {
            embedding: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            reranker: "BAAI/bge-reranker-base".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            retrieve_k: 20,
            top_k: 5,
        }
    }
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        GuardrailConfig {
            contact_email: "applieddatascience-admissions@uchicago.edu".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(&config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".admitbuddy").join("config.toml"))
    }

    /// Get the Ollama base URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            qdrant: QdrantConfig::default(),
            ollama: OllamaConfig::default(),
            models: ModelsConfig::default(),
            pipeline: PipelineConfig::default(),
            guardrail: GuardrailConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.qdrant.collection, "program_docs");
        assert_eq!(config.pipeline.retrieve_k, 20);
        assert_eq!(config.pipeline.top_k, 5);
        assert!(config.guardrail.contact_email.contains("uchicago.edu"));
    }

    #[test]
    fn test_ollama_url() {
        let config = Config::default();
        assert_eq!(config.ollama_url(), "http://127.0.0.1:11434");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();
        assert!(toml_string.contains("program_docs"));
        assert!(toml_string.contains("bge-reranker-base"));
    }

    #[test]
    fn test_config_roundtrip_with_missing_sections() {
        // Older config files may lack newer sections; defaults fill in
        let parsed: Config = toml::from_str("[qdrant]\nurl = \"http://10.0.0.5:6334\"\ncollection = \"docs\"\n").unwrap();
        assert_eq!(parsed.qdrant.url, "http://10.0.0.5:6334");
        assert_eq!(parsed.pipeline.top_k, 5);
    }
}
