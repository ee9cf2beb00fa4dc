use serde::{Deserialize, Serialize};

/// Interview participants: `q` asks the questions, `a` answers them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participants {
    pub q: String,
    pub a: String,
}

/// Canonical per-transcript metadata, carried unchanged through every
/// pipeline stage (retrieval, aggregation, packing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub participants: Participants,
    pub date: String,
    pub url: String,
}

/// A parsed interview transcript. Exchanges are `[question, answer]` pairs
/// in original interview order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub participants: Participants,
    pub date: String,
    pub url: String,
    pub exchanges: Vec<(String, String)>,
}

impl Transcript {
    pub fn metadata(&self) -> TranscriptMetadata {
        TranscriptMetadata {
            participants: self.participants.clone(),
            date: self.date.clone(),
            url: self.url.clone(),
        }
    }
}

/// One question/answer pair lifted out of a transcript for processing.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// A memory candidate returned by similarity search. Consumed once by the
/// usefulness filter, never mutated.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub date: String,
    pub document: String,
    pub participants: String,
    pub url: String,
}

/// The filtered/rewritten form of a fragment. An empty `memory` means the
/// fragment was judged not useful for the current question.
#[derive(Debug, Clone)]
pub struct Summary {
    pub date: String,
    pub memory: String,
}

impl Summary {
    /// A summary that contributes nothing to the aggregated memory text.
    pub fn skipped(date: String) -> Self {
        Self {
            date,
            memory: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

/// One training example: a question/answer exchange plus the aggregated
/// memory text, when at least one retrieved fragment survived the filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_memories: Option<String>,
}

/// A transcript's worth of examples, in chronological (interview) order.
#[derive(Debug, Clone)]
pub struct Group {
    pub metadata: TranscriptMetadata,
    pub examples: Vec<Example>,
}

/// One record of the intermediate dataset file: a JSON array mixing
/// `{"metadata": {...}}` group markers with `{"example": {...}}` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetRecord {
    Metadata(TranscriptMetadata),
    Example(Example),
}

/// Role-tagged chat turn in the OpenAI fine-tune message shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
            name: None,
        }
    }

    pub fn user(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
            name: Some(name.into()),
        }
    }

    pub fn assistant(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
            name: Some(name.into()),
        }
    }

    pub fn function(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: "function".into(),
            content: content.into(),
            name: Some(name.into()),
        }
    }
}
