use async_trait::async_trait;

use memtune_common::ChatMessage;

/// LLM provider trait (OpenAI, or a test double).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Model identifier (e.g. "gpt-4").
    fn id(&self) -> &str;

    /// One blocking-latency network round-trip: messages in, text out.
    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}
