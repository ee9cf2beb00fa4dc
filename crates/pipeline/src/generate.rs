//! Dataset generation: walk each transcript's exchanges, retrieve and filter
//! memories for every question, and append the results to the intermediate
//! JSON array consumed by the packer.

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use {
    anyhow::{Context, Result},
    tracing::info,
};

use {
    crate::summarize::{Summarizer, aggregate},
    memtune_common::{DatasetRecord, Example, Exchange, Transcript},
    memtune_memory::retriever::Retriever,
};

/// Incremental writer for the intermediate JSON array: open bracket up
/// front, comma-separated pretty records, closing bracket on `finish`.
/// Append-only, single-writer.
pub struct DatasetWriter {
    file: std::fs::File,
    wrote_any: bool,
}

impl DatasetWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(b"[\n")?;
        Ok(Self {
            file,
            wrote_any: false,
        })
    }

    pub fn write_record(&mut self, record: &DatasetRecord) -> Result<()> {
        if self.wrote_any {
            self.file.write_all(b",\n")?;
        }
        self.file.write_all(serde_json::to_string_pretty(record)?.as_bytes())?;
        self.wrote_any = true;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.file.write_all(b"\n]")?;
        self.file.flush()?;
        Ok(())
    }
}

/// Orchestrates retrieval and summarization per exchange. Client handles are
/// injected once at construction; nothing here talks to the filesystem to
/// discover transcripts — the caller supplies the explicit list.
pub struct Generator {
    retriever: Retriever,
    summarizer: Summarizer,
    throttle: Duration,
}

impl Generator {
    pub fn new(retriever: Retriever, summarizer: Summarizer) -> Self {
        Self {
            retriever,
            summarizer,
            throttle: Duration::ZERO,
        }
    }

    /// Fixed delay between successive exchanges, for rate limiting.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Process transcripts in order, writing one metadata record per
    /// transcript and one example record per exchange.
    pub async fn run(
        &self,
        transcript_paths: &[PathBuf],
        collection: &str,
        out_path: &Path,
    ) -> Result<()> {
        let mut writer = DatasetWriter::create(out_path)?;
        let mut prev_answer: Option<String> = None;

        for path in transcript_paths {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read transcript {}", path.display()))?;
            let transcript: Transcript = serde_json::from_str(&raw)
                .with_context(|| format!("malformed transcript {}", path.display()))?;
            let metadata = transcript.metadata();

            info!(
                path = %path.display(),
                exchanges = transcript.exchanges.len(),
                "processing transcript"
            );
            writer.write_record(&DatasetRecord::Metadata(metadata.clone()))?;

            for (question, answer) in &transcript.exchanges {
                let exchange = Exchange {
                    question: question.clone(),
                    answer: answer.clone(),
                };
                let fragments = self
                    .retriever
                    .retrieve(&exchange, collection, &metadata)
                    .await?;
                let summaries = self
                    .summarizer
                    .summarize_all(
                        &metadata.participants.a,
                        question,
                        prev_answer.as_deref(),
                        fragments,
                    )
                    .await;
                let similar_memories = aggregate(&summaries);

                writer.write_record(&DatasetRecord::Example(Example {
                    question: exchange.question,
                    answer: exchange.answer,
                    similar_memories: (!similar_memories.is_empty()).then_some(similar_memories),
                }))?;

                prev_answer = Some(answer.clone());
                if !self.throttle.is_zero() {
                    tokio::time::sleep(self.throttle).await;
                }
            }
        }

        writer.finish()
    }
}
