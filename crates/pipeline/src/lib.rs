//! The dataset pipeline: per-exchange retrieval → usefulness filtering →
//! aggregation into intermediate records (`generate`), then token-budget
//! packing of those records into training windows (`pack`).

pub mod generate;
pub mod pack;
pub mod prompts;
pub mod summarize;
