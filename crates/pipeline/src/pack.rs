//! Greedy token-budget packing: one training window per example, ending on
//! that example's answer and primed with as much earlier dialogue as fits
//! strictly under the budget.

use std::path::Path;

use {
    anyhow::{Context, Result},
    tracing::{info, warn},
};

use {
    crate::prompts::interview_system_message,
    memtune_common::{
        ChatMessage, DatasetRecord, Example, Group, Participants,
        tokens::estimate_message_tokens,
    },
};

/// Convert one example into role-tagged messages plus their token cost.
/// Speaker names are attached with spaces stripped; the optional memory text
/// rides along as a `retrieve_memories` function turn between question and
/// answer.
pub fn oaify(example: &Example, participants: &Participants) -> (Vec<ChatMessage>, usize) {
    let mut messages = vec![ChatMessage::user(
        example.question.as_str(),
        participants.q.replace(' ', ""),
    )];
    if let Some(memories) = &example.similar_memories {
        messages.push(ChatMessage::function(memories.as_str(), "retrieve_memories"));
    }
    messages.push(ChatMessage::assistant(
        example.answer.as_str(),
        participants.a.replace(' ', ""),
    ));
    let size = estimate_message_tokens(&messages);
    (messages, size)
}

/// Pack one group into training windows, one per example.
///
/// The group is reversed internally (newest first), so the walk from an
/// anchor toward higher indices visits chronologically older examples; each
/// that fits is prepended. The budget is a strict upper bound for the
/// inclusion decision, but the anchor itself is always emitted, oversized or
/// not. Windows come back in chronological anchor order.
pub fn pack_group(group: &Group, token_budget: usize) -> Vec<Vec<ChatMessage>> {
    let system = interview_system_message(&group.metadata);
    let system_tokens = estimate_message_tokens(std::slice::from_ref(&system));
    let participants = &group.metadata.participants;

    let reversed: Vec<&Example> = group.examples.iter().rev().collect();

    let mut windows: Vec<Vec<ChatMessage>> = Vec::with_capacity(reversed.len());
    for (i, anchor) in reversed.iter().enumerate() {
        let (mut messages, anchor_tokens) = oaify(anchor, participants);
        let mut total = system_tokens + anchor_tokens;

        if total >= token_budget {
            // Never drop or truncate the anchor; surface the condition for
            // monitoring and move on.
            warn!(
                window_tokens = total,
                token_budget, "oversized window: anchor alone meets or exceeds budget"
            );
        } else {
            for older in &reversed[i + 1..] {
                let (older_messages, older_tokens) = oaify(older, participants);
                if total + older_tokens >= token_budget {
                    break;
                }
                // Prepend: context runs oldest-first, anchor last.
                messages.splice(0..0, older_messages);
                total += older_tokens;
            }
        }

        let mut window = Vec::with_capacity(messages.len() + 1);
        window.push(system.clone());
        window.extend(messages);
        windows.push(window);
    }

    // Anchors were visited newest-first; emit chronologically.
    windows.reverse();
    windows
}

/// Fold intermediate records into groups: a metadata record starts a new
/// group, example records attach to the latest one.
pub fn group_records(records: Vec<DatasetRecord>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for record in records {
        match record {
            DatasetRecord::Metadata(metadata) => groups.push(Group {
                metadata,
                examples: Vec::new(),
            }),
            DatasetRecord::Example(example) => match groups.last_mut() {
                Some(group) => group.examples.push(example),
                None => warn!("example record before any metadata record, dropping"),
            },
        }
    }
    groups
}

/// Pack the intermediate dataset file into a JSONL training file, one
/// `{"messages": [...]}` object per window. Returns the window count.
pub fn pack_dataset(in_path: &Path, out_path: &Path, token_budget: usize) -> Result<usize> {
    let raw = std::fs::read_to_string(in_path)
        .with_context(|| format!("failed to read dataset {}", in_path.display()))?;
    let records: Vec<DatasetRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("malformed dataset {}", in_path.display()))?;
    let groups = group_records(records);

    let mut out = String::new();
    let mut windows_written = 0;
    for group in &groups {
        for window in pack_group(group, token_budget) {
            out.push_str(&serde_json::to_string(&serde_json::json!({ "messages": window }))?);
            out.push('\n');
            windows_written += 1;
        }
    }

    std::fs::write(out_path, out)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    info!(windows = windows_written, path = %out_path.display(), "wrote packed dataset");
    Ok(windows_written)
}
