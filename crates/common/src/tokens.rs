//! Token estimation shared by the retriever (chunk budget) and the packer
//! (window budget).

use crate::types::ChatMessage;

/// Rough token estimate: ~4 characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

/// Token estimate for a message list, counted over its JSON serialization so
/// that role/name overhead is included, the same way the packed output is
/// measured by the fine-tuning endpoint.
pub fn estimate_message_tokens(messages: &[ChatMessage]) -> usize {
    serde_json::to_string(messages).map_or(0, |json| estimate_tokens(&json))
}
