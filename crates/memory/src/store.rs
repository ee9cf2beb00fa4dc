/// Storage abstraction for the embedding store: persisted vectors keyed by
/// fingerprint, shared across runs, queried by similarity.
use async_trait::async_trait;

/// A document persisted alongside its embedding.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Deduplication fingerprint (or chunk id for grounding documents).
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    /// String-keyed metadata (date, participants, url, ...).
    pub metadata: serde_json::Value,
}

/// One similarity-search result, closest first.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub document: String,
    pub metadata: serde_json::Value,
    pub score: f32,
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert or replace a document by `(collection, id)`. Last write wins;
    /// the cache is idempotent because the same fingerprint maps to the same
    /// embedding.
    async fn upsert(&self, collection: &str, doc: &StoredDocument) -> anyhow::Result<()>;

    /// Fetch a previously stored embedding by fingerprint.
    async fn get_embedding(&self, collection: &str, id: &str)
    -> anyhow::Result<Option<Vec<f32>>>;

    /// The `k` nearest neighbors of `embedding`, ranked closest first. Ties
    /// keep insertion order.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> anyhow::Result<Vec<QueryHit>>;
}
