//! LLM chat-completion providers. The pipeline treats a provider as an
//! opaque messages-in/text-out function; retry and backoff live with the
//! caller, not here.

pub mod model;
pub mod openai;

pub use {model::LlmProvider, openai::OpenAiProvider};
