// Answer generation collaborator (black-box text completion via Ollama)
pub mod client;
pub mod prompt;

pub use client::OllamaClient;
pub use prompt::build_prompt;
