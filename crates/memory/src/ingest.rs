//! Grounding ingestion: load pre-chunked blog posts (JSONL) and store each
//! chunk's embedding so interview questions can retrieve them later.

use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
    tracing::info,
};

use {
    crate::{
        embeddings::EmbeddingProvider,
        store::{MemoryStore, StoredDocument},
    },
    memtune_common::tokens::estimate_tokens,
};

/// One pre-chunked blog post part, as produced by the external chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub document: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub title: String,
    pub url: String,
    pub date: String,
    pub part: usize,
    pub total_parts: usize,
}

/// Embed every chunk in `path` and upsert it into `collection`, keyed by
/// `"{title}_part_{part}"`. Chunks over the embedding budget are truncated
/// rather than rejected. Returns the number of chunks stored.
pub async fn ingest_chunks(
    store: Arc<dyn MemoryStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    collection: &str,
    path: &Path,
    embedding_budget: usize,
) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read chunk file {}", path.display()))?;

    let mut stored = 0;
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let chunk: ChunkRecord = serde_json::from_str(line)
            .with_context(|| format!("malformed chunk record at line {}", lineno + 1))?;

        info!(title = %chunk.metadata.title, part = chunk.metadata.part, "storing chunk");

        let document = truncate_to_budget(&chunk.document, embedding_budget);
        let embedding = embeddings.embed(document).await?;
        let id = format!("{}_part_{}", chunk.metadata.title, chunk.metadata.part);

        store
            .upsert(collection, &StoredDocument {
                id,
                embedding,
                document: document.to_string(),
                metadata: serde_json::to_value(&chunk.metadata)?,
            })
            .await?;
        stored += 1;
    }

    Ok(stored)
}

/// Clamp a document to the embedding token budget (approximate, by chars).
fn truncate_to_budget(document: &str, budget: usize) -> &str {
    if estimate_tokens(document) <= budget {
        return document;
    }
    let max_bytes = budget * 4;
    // Back off to a char boundary.
    let mut end = max_bytes.min(document.len());
    while end > 0 && !document.is_char_boundary(end) {
        end -= 1;
    }
    &document[..end]
}
