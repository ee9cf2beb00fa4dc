//! Shared data model for the fine-tuning dataset pipeline:
//! transcripts → exchanges → retrieved fragments → summaries → examples →
//! packed training windows.

pub mod tokens;
pub mod types;

pub use types::{
    ChatMessage, DatasetRecord, Example, Exchange, Fragment, Group, Participants, Summary,
    Transcript, TranscriptMetadata,
};
