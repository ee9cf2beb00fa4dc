//! Prompt builders for the usefulness filter and the packed-window system
//! message.

use memtune_common::{ChatMessage, TranscriptMetadata};

/// Sentinel the filter model answers when a memory does not help.
pub const SKIP_SENTINEL: &str = "skip";

/// Messages for one fragment's usefulness/rewrite call.
///
/// With `skip_filter` set, the judging clause is dropped and the model
/// always rewrites.
pub fn summarize_memory_messages(
    author: &str,
    question: &str,
    prev_answer: Option<&str>,
    memory: &str,
    skip_filter: bool,
) -> Vec<ChatMessage> {
    let system = if skip_filter {
        format!(
            "You are helping {author} prepare for an interview.\n\
             Rephrase the quote from their blog, or extract from a previous interview \
             presented here, from their perspective, in a way that would be helpful for \
             answering the question, in one or two sentences - type it directly, without intro."
        )
    } else {
        format!(
            "You are helping {author} prepare for an interview.\n\
             Decide whether the quote from their blog, or extract from a previous interview \
             presented here, is helpful in answering the question.\n\
             If it is, rephrase it from their perspective, in a way that would be helpful for \
             answering, in one or two sentences - type it directly, without intro. \
             If it is not helpful, simply type 'skip'."
        )
    };

    let user = format!(
        "Previous answer, for context: {}\nQuestion: {question}\nMemory: {memory}",
        prev_answer.unwrap_or("none")
    );

    vec![ChatMessage::system(system), ChatMessage::user(user, author.replace(' ', ""))]
}

/// System message heading every packed training window.
pub fn interview_system_message(metadata: &TranscriptMetadata) -> ChatMessage {
    ChatMessage::system(format!(
        "{} is interviewing you, {}. It is the {}.\n\n\
         To better answer the questions, some memories from your past writing will be \
         retrieved if available, by the retrieve_memories function. It will be called \
         automatically.",
        metadata.participants.q, metadata.participants.a, metadata.date
    ))
}

#[cfg(test)]
mod tests {
    use {super::*, memtune_common::Participants};

    #[test]
    fn filtering_prompt_mentions_the_sentinel() {
        let messages =
            summarize_memory_messages("Sam Guest", "Why?", Some("Because."), "a memory", false);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("simply type 'skip'"));
        assert!(messages[1].content.contains("Previous answer, for context: Because."));
        assert!(messages[1].content.contains("Memory: a memory"));
    }

    #[test]
    fn skip_filter_prompt_always_rewrites() {
        let messages = summarize_memory_messages("Sam Guest", "Why?", None, "a memory", true);
        assert!(!messages[0].content.contains("skip"));
        assert!(messages[1].content.contains("Previous answer, for context: none"));
    }

    #[test]
    fn system_message_names_both_participants() {
        let message = interview_system_message(&TranscriptMetadata {
            participants: Participants {
                q: "Pat Host".into(),
                a: "Sam Guest".into(),
            },
            date: "2021-03-01".into(),
            url: "https://example.com/i1".into(),
        });
        assert_eq!(message.role, "system");
        assert!(
            message
                .content
                .starts_with("Pat Host is interviewing you, Sam Guest. It is the 2021-03-01.")
        );
        assert!(message.content.contains("retrieve_memories"));
    }
}
