/// Config schema types for the dataset builder (provider credentials,
/// retrieval, pipeline, and packing sections).
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemtuneConfig {
    pub openai: OpenAiConfig,
    pub memory: MemoryConfig,
    pub pipeline: PipelineConfig,
    pub pack: PackConfig,
    /// Directory holding transcripts, chunked posts, the embedding store,
    /// and generated output files.
    pub data_dir: PathBuf,
}

impl Default for MemtuneConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            memory: MemoryConfig::default(),
            pipeline: PipelineConfig::default(),
            pack: PackConfig::default(),
            data_dir: PathBuf::from("data"),
        }
    }
}

/// OpenAI credentials and model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key. `${OPENAI_API_KEY}` placeholders are substituted at load
    /// time; when unset, the `OPENAI_API_KEY` env var is used directly.
    pub api_key: Option<String>,
    /// Override the API base URL.
    pub base_url: Option<String>,
    /// Chat model used by the usefulness filter.
    pub chat_model: String,
    /// Embedding model for similarity search.
    pub embedding_model: String,
    /// Dimensionality of the embedding model's vectors.
    pub embedding_dims: usize,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            chat_model: "gpt-4".into(),
            embedding_model: "text-embedding-ada-002".into(),
            embedding_dims: 1536,
        }
    }
}

impl OpenAiConfig {
    /// Configured key, falling back to the `OPENAI_API_KEY` env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

/// Similarity retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Number of nearest neighbors returned per question.
    pub k: usize,
    /// Token budget for one embedded chunk.
    pub embedding_budget: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            k: 3,
            embedding_budget: 2048,
        }
    }
}

/// Generation pipeline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rewrite every fragment without the usefulness judgment.
    pub skip_filter: bool,
    /// Fixed delay between successive exchanges, for rate limiting.
    pub throttle_ms: u64,
    /// Summarization worker bound. Defaults to
    /// `min(available_parallelism, fragment count)` when unset.
    pub concurrency: Option<usize>,
}

/// Training-window packing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Maximum token count for one packed training window.
    pub token_budget: usize,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self { token_budget: 4096 }
    }
}
