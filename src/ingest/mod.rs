//! Corpus ingestion: load program documents, chunk, embed, index.
//!
//! The corpus is a directory of `.txt` files produced by the external
//! scraper; each file is one source document and its file name becomes the
//! passage `source_id`.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::embedding::EmbeddingEngine;
use crate::errors::{AssistantError, Result};
use crate::store::qdrant::ChunkRecord;
use crate::store::VectorStore;

/// Chunks are packed up to this many characters so a single passage stays
/// well inside the context budget
const MAX_CHUNK_CHARS: usize = 1200;

/// Texts embedded per forward pass
const EMBED_BATCH: usize = 16;

/// One source document loaded from disk
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub source: String,
    pub text: String,
}

/// Ingestion summary
#[derive(Debug, Clone, Copy)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Load every `*.txt` file from a directory (non-recursive)
pub fn load_documents(dir: &Path) -> Result<Vec<RawDocument>> {
    if !dir.is_dir() {
        return Err(AssistantError::IngestError(format!(
            "Documents directory not found: {}",
            dir.display()
        )));
    }

    let mut documents = Vec::new();

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "txt").unwrap_or(false))
        .collect();
    entries.sort();

    for path in entries {
        let text = std::fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            continue;
        }

        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        documents.push(RawDocument { source, text });
    }

    Ok(documents)
}

/// Split a document into paragraph chunks bounded by `max_chars`.
///
/// Paragraphs are packed greedily so a date mention stays with its
/// surrounding sentences; only paragraphs longer than the bound are split
/// mid-text.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if paragraph.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let mut rest = paragraph;
            while rest.len() > max_chars {
                let mut cut = max_chars;
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                chunks.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            if !rest.is_empty() {
                chunks.push(rest.to_string());
            }
            continue;
        }

        if !current.is_empty() && current.len() + 2 + paragraph.len() > max_chars {
            chunks.push(std::mem::take(&mut current));
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Embeds and indexes the corpus
pub struct Ingestor {
    embedder: Arc<EmbeddingEngine>,
    store: Arc<VectorStore>,
}

impl Ingestor {
    pub fn new(embedder: Arc<EmbeddingEngine>, store: Arc<VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Ingest a documents directory into the vector index
    pub async fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        let documents = load_documents(dir)?;
        if documents.is_empty() {
            return Ok(IngestReport {
                documents: 0,
                chunks: 0,
            });
        }

        self.store
            .ensure_collection()
            .await
            .map_err(|e| AssistantError::IndexUnavailable {
                reason: e.to_string(),
            })?;

        let mut pending: Vec<(String, String)> = Vec::new();
        for doc in &documents {
            for chunk in chunk_text(&doc.text, MAX_CHUNK_CHARS) {
                pending.push((doc.source.clone(), chunk));
            }
        }

        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} chunks")
                .unwrap(),
        );

        let mut total_chunks = 0;
        for batch in pending.chunks(EMBED_BATCH) {
            let texts: Vec<&str> = batch.iter().map(|(_, text)| text.as_str()).collect();
            let embeddings = self
                .embedder
                .embed_batch(&texts)
                .map_err(|e| AssistantError::EmbeddingError(e.to_string()))?;

            let records: Vec<ChunkRecord> = batch
                .iter()
                .zip(embeddings)
                .map(|((source, text), embedding)| ChunkRecord {
                    id: Uuid::new_v4().to_string(),
                    text: text.clone(),
                    source: source.clone(),
                    embedding,
                })
                .collect();

            self.store
                .upsert_chunks(records)
                .await
                .map_err(|e| AssistantError::IndexUnavailable {
                    reason: e.to_string(),
                })?;

            total_chunks += batch.len();
            pb.inc(batch.len() as u64);
        }

        pb.finish_and_clear();

        Ok(IngestReport {
            documents: documents.len(),
            chunks: total_chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_chunk_packs_paragraphs() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunk_text(text, 1200);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("First paragraph."));
        assert!(chunks[0].contains("Third paragraph."));
    }

    #[test]
    fn test_chunk_splits_at_bound() {
        let text = format!("{}\n\n{}", "a".repeat(50), "b".repeat(50));
        let chunks = chunk_text(&text, 60);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_chunk_hard_splits_oversized_paragraph() {
        let text = "x".repeat(250);
        let chunks = chunk_text(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= 100));
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("\n\n\n\n", 100).is_empty());
    }

    #[test]
    fn test_load_documents_reads_txt_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("deadlines.txt"), "Round 1 closes soon.").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "deadlines.txt");
    }

    #[test]
    fn test_load_documents_skips_empty_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty.txt"), "   \n").unwrap();
        fs::write(dir.path().join("real.txt"), "Content.").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "real.txt");
    }

    #[test]
    fn test_load_documents_missing_dir_errors() {
        let err = load_documents(Path::new("/nonexistent/corpus")).unwrap_err();
        assert!(matches!(err, AssistantError::IngestError(_)));
    }
}
