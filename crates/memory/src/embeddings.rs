/// Provider-agnostic embedding trait for generating vectors from text.
use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// The model name used by this provider (e.g. "text-embedding-ada-002").
    fn model_name(&self) -> &str;

    /// The dimensionality of the embeddings produced.
    fn dimensions(&self) -> usize;

    /// A stable key identifying this provider configuration. Different
    /// providers or the same provider with different settings should return
    /// different keys, so vectors from one model are never compared against
    /// another's.
    fn provider_key(&self) -> &str;
}
