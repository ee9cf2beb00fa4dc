//! Usefulness filter & summarizer: one LLM call per fragment with bounded
//! parallelism, plus aggregation of the surviving notes.

use std::sync::Arc;

use {
    futures::{StreamExt, stream},
    tracing::warn,
};

use {
    crate::prompts::{SKIP_SENTINEL, summarize_memory_messages},
    memtune_common::{Fragment, Summary},
    memtune_providers::LlmProvider,
};

pub struct Summarizer {
    llm: Arc<dyn LlmProvider>,
    skip_filter: bool,
    concurrency: Option<usize>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            skip_filter: false,
            concurrency: None,
        }
    }

    /// Rewrite every fragment without the usefulness judgment.
    pub fn with_skip_filter(mut self, skip_filter: bool) -> Self {
        self.skip_filter = skip_filter;
        self
    }

    /// Override the worker bound (default: one per core, capped at the
    /// fragment count).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Summarize all fragments, one LLM call each, gathered index-aligned:
    /// the output order matches the input order regardless of completion
    /// order. A failed call degrades to an empty summary for that fragment
    /// only; siblings are unaffected.
    pub async fn summarize_all(
        &self,
        author: &str,
        question: &str,
        prev_answer: Option<&str>,
        fragments: Vec<Fragment>,
    ) -> Vec<Summary> {
        if fragments.is_empty() {
            return Vec::new();
        }

        let workers = self
            .concurrency
            .unwrap_or_else(default_workers)
            .min(fragments.len())
            .max(1);

        stream::iter(fragments.into_iter().map(|fragment| {
            let llm = Arc::clone(&self.llm);
            let messages = summarize_memory_messages(
                author,
                question,
                prev_answer,
                &fragment.document,
                self.skip_filter,
            );
            async move {
                match llm.complete(&messages).await {
                    Ok(response) => summary_from_response(fragment.date, &response),
                    Err(e) => {
                        // One failed memory lookup never aborts the exchange.
                        warn!(error = %e, "memory summarization failed, dropping fragment");
                        Summary::skipped(fragment.date)
                    },
                }
            }
        }))
        .buffered(workers)
        .collect()
        .await
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, usize::from)
}

/// A response equal to the skip sentinel (compared with non-word characters
/// removed, lowercased) yields an empty summary; anything else is kept
/// trimmed.
fn summary_from_response(date: String, response: &str) -> Summary {
    if normalize(response) == SKIP_SENTINEL {
        Summary::skipped(date)
    } else {
        Summary {
            date,
            memory: response.trim().to_string(),
        }
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Concatenate useful summaries with their provenance date, in filter order.
/// The empty string is the documented "no relevant memory" signal.
pub fn aggregate(summaries: &[Summary]) -> String {
    let mut out = String::new();
    for summary in summaries {
        if summary.is_empty() {
            continue;
        }
        out.push_str(&format!("from {}: \n {}\n\n", summary.date, summary.memory));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use {super::*, memtune_common::ChatMessage};

    fn fragment(document: &str) -> Fragment {
        Fragment {
            date: "2020-06-01".into(),
            document: document.into(),
            participants: "Pat Host, Sam Guest".into(),
            url: "https://example.com".into(),
        }
    }

    /// Echoes the memory line of the prompt back, with a per-call delay
    /// parsed from the document ("slow" waits longer), so completion order
    /// differs from submission order.
    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        fn name(&self) -> &str {
            "echo"
        }

        fn id(&self) -> &str {
            "echo-1"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
            let user = &messages[1].content;
            let memory = user
                .rsplit("Memory: ")
                .next()
                .unwrap_or_default()
                .to_string();
            if memory.contains("slow") {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            if memory.contains("fail") {
                anyhow::bail!("provider unavailable");
            }
            if memory.contains("useless") {
                return Ok("Skip.".into());
            }
            Ok(format!("  note about {memory}  "))
        }
    }

    #[test]
    fn sentinel_comparison_is_normalized() {
        for response in ["skip", "Skip.", " SKIP ", "'skip'"] {
            let summary = summary_from_response("2020-06-01".into(), response);
            assert!(summary.is_empty(), "{response:?} should be a skip");
        }
        let summary = summary_from_response("2020-06-01".into(), "skipping stones");
        assert!(!summary.is_empty());
    }

    #[test]
    fn non_skip_response_is_trimmed() {
        let summary = summary_from_response("2020-06-01".into(), "  a useful note \n");
        assert_eq!(summary.memory, "a useful note");
    }

    #[test]
    fn aggregate_skips_empty_and_preserves_order() {
        let summaries = vec![
            Summary::skipped("2019-01-01".into()),
            Summary {
                date: "2020-06-01".into(),
                memory: "a useful note".into(),
            },
        ];
        assert_eq!(aggregate(&summaries), "from 2020-06-01: \n a useful note\n\n");

        let all_empty = vec![
            Summary::skipped("2019-01-01".into()),
            Summary::skipped("2020-06-01".into()),
        ];
        assert_eq!(aggregate(&all_empty), "");
    }

    #[test]
    fn aggregate_concatenates_in_order() {
        let summaries = vec![
            Summary {
                date: "2019-01-01".into(),
                memory: "first".into(),
            },
            Summary {
                date: "2020-06-01".into(),
                memory: "second".into(),
            },
        ];
        assert_eq!(
            aggregate(&summaries),
            "from 2019-01-01: \n first\n\nfrom 2020-06-01: \n second\n\n"
        );
    }

    #[tokio::test]
    async fn results_are_index_aligned_despite_completion_order() {
        let summarizer = Summarizer::new(Arc::new(EchoLlm)).with_concurrency(4);
        let fragments = vec![fragment("slow memory"), fragment("fast memory")];

        let summaries = summarizer
            .summarize_all("Sam Guest", "Why?", None, fragments)
            .await;

        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].memory.contains("slow memory"));
        assert!(summaries[1].memory.contains("fast memory"));
    }

    #[tokio::test]
    async fn one_failure_degrades_only_that_fragment() {
        let summarizer = Summarizer::new(Arc::new(EchoLlm)).with_concurrency(2);
        let fragments = vec![fragment("fail memory"), fragment("good memory")];

        let summaries = summarizer
            .summarize_all("Sam Guest", "Why?", None, fragments)
            .await;

        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].is_empty());
        assert!(summaries[1].memory.contains("good memory"));
    }

    #[tokio::test]
    async fn skip_responses_become_empty_summaries() {
        let summarizer = Summarizer::new(Arc::new(EchoLlm));
        let fragments = vec![fragment("useless memory"), fragment("good memory")];

        let summaries = summarizer
            .summarize_all("Sam Guest", "Why?", Some("prev"), fragments)
            .await;

        assert!(summaries[0].is_empty());
        assert!(!summaries[1].is_empty());
    }

    #[tokio::test]
    async fn empty_fragment_list_yields_no_summaries() {
        let summarizer = Summarizer::new(Arc::new(EchoLlm));
        let summaries = summarizer
            .summarize_all("Sam Guest", "Why?", None, vec![])
            .await;
        assert!(summaries.is_empty());
    }
}
