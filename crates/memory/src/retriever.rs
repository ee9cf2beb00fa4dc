//! Similarity retrieval for one question/answer exchange: fingerprint the
//! question, embed it (cache-first), persist, and return the nearest
//! fragments from past material.

use std::sync::Arc;

use {anyhow::Result, tracing::debug};

use {
    memtune_common::{Exchange, Fragment, TranscriptMetadata},
    crate::{
        embeddings::EmbeddingProvider,
        store::{MemoryStore, StoredDocument},
    },
};

const UNKNOWN_DATE: &str = "Unknown date";
const UNKNOWN_PARTICIPANTS: &str = "Unknown participants";

/// Deduplication fingerprint for a question: the namespacing url plus the
/// first 20 characters of the question text, stripped of non-word characters
/// and lowercased.
///
/// This is intentionally a prefix key, not a full hash: questions sharing a
/// 20-character prefix collide and reuse the stored embedding. Existing
/// stores depend on the collision behavior, so don't switch to full-text
/// hashing.
pub fn fingerprint(url: &str, question: &str) -> String {
    let prefix: String = question.chars().take(20).collect();
    url.chars()
        .chain(prefix.chars())
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Similarity retriever over the shared embedding store.
pub struct Retriever {
    store: Arc<dyn MemoryStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    k: usize,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        k: usize,
    ) -> Self {
        Self {
            store,
            embeddings,
            k,
        }
    }

    /// Embed the exchange's question (reusing the stored vector when the
    /// fingerprint is already cached), persist it for future runs, and
    /// return at most `k` similar fragments, closest first.
    pub async fn retrieve(
        &self,
        exchange: &Exchange,
        collection: &str,
        metadata: &TranscriptMetadata,
    ) -> Result<Vec<Fragment>> {
        let id = fingerprint(&metadata.url, &exchange.question);

        let embedding = match self.store.get_embedding(collection, &id).await? {
            Some(embedding) => {
                debug!(%id, "embedding found in store");
                embedding
            },
            None => {
                debug!(%id, "computing embedding");
                // Only the question is embedded, keeping query vectors
                // aligned with the question/document vectors in the corpus.
                let embedding = self.embeddings.embed(&exchange.question).await?;
                let document = format!(
                    "In a past interview, you answered '{}' with:\n\n {}",
                    exchange.question, exchange.answer
                );
                // Participants flattened to one comma-joined string; the
                // store only carries string-valued metadata.
                let participants =
                    format!("{}, {}", metadata.participants.q, metadata.participants.a);
                self.store
                    .upsert(collection, &StoredDocument {
                        id,
                        embedding: embedding.clone(),
                        document,
                        metadata: serde_json::json!({
                            "date": metadata.date,
                            "url": metadata.url,
                            "participants": participants,
                        }),
                    })
                    .await?;
                embedding
            },
        };

        let hits = self.store.query(collection, &embedding, self.k).await?;
        Ok(hits
            .into_iter()
            .map(|hit| Fragment {
                date: str_field(&hit.metadata, "date", UNKNOWN_DATE),
                participants: str_field(&hit.metadata, "participants", UNKNOWN_PARTICIPANTS),
                url: str_field(&hit.metadata, "url", ""),
                document: hit.document,
            })
            .collect())
    }
}

fn str_field(metadata: &serde_json::Value, key: &str, default: &str) -> String {
    metadata
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}
