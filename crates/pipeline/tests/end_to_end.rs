//! End-to-end pipeline test: a transcript plus a seeded blog chunk, run
//! through generation with stub providers, then packed into JSONL windows.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use {
    memtune_common::{ChatMessage, DatasetRecord},
    memtune_memory::{
        embeddings::EmbeddingProvider,
        retriever::Retriever,
        store::{MemoryStore, QueryHit, StoredDocument},
    },
    memtune_pipeline::{
        generate::Generator,
        pack::pack_dataset,
        summarize::Summarizer,
    },
    memtune_providers::LlmProvider,
};

struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn model_name(&self) -> &str {
        "stub"
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn provider_key(&self) -> &str {
        "stub"
    }
}

#[derive(Default)]
struct InMemoryStore {
    docs: Mutex<Vec<StoredDocument>>,
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn upsert(&self, _collection: &str, doc: &StoredDocument) -> anyhow::Result<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.retain(|d| d.id != doc.id);
        docs.push(doc.clone());
        Ok(())
    }

    async fn get_embedding(
        &self,
        _collection: &str,
        id: &str,
    ) -> anyhow::Result<Option<Vec<f32>>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.embedding.clone()))
    }

    async fn query(
        &self,
        _collection: &str,
        _embedding: &[f32],
        k: usize,
    ) -> anyhow::Result<Vec<QueryHit>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .take(k)
            .map(|d| QueryHit {
                document: d.document.clone(),
                metadata: d.metadata.clone(),
                score: 1.0,
            })
            .collect())
    }
}

/// Judges blog chunks useful and interview echoes useless.
struct JudgingLlm;

#[async_trait]
impl LlmProvider for JudgingLlm {
    fn name(&self) -> &str {
        "judging"
    }

    fn id(&self) -> &str {
        "judging-1"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        if messages[1].content.contains("I wrote about focus") {
            Ok("I believe focus beats raw effort.".into())
        } else {
            Ok("skip".into())
        }
    }
}

fn transcript_json() -> &'static str {
    r#"{
        "participants": {"q": "Pat Host", "a": "Sam Guest"},
        "date": "2021-03-01",
        "url": "https://example.com/interview-1",
        "exchanges": [
            ["What matters most in your work?", "Focus, without question."],
            ["How do you keep it?", "Ruthless scheduling."]
        ]
    }"#
}

#[tokio::test]
async fn generate_then_pack_produces_training_windows() {
    let dir = tempfile::tempdir().unwrap();
    let transcript_path = dir.path().join("blog_transcript_1.json");
    std::fs::write(&transcript_path, transcript_json()).unwrap();

    let store = Arc::new(InMemoryStore::default());
    store
        .upsert("blog", &StoredDocument {
            id: "Focus_part_1".into(),
            embedding: vec![1.0, 0.0],
            document: "I wrote about focus and why it compounds.".into(),
            metadata: serde_json::json!({
                "date": "2020-06-01",
                "url": "https://blog.example.com/focus",
                "participants": "Sam Guest",
            }),
        })
        .await
        .unwrap();

    let retriever = Retriever::new(store.clone(), Arc::new(StubEmbedder), 3);
    let summarizer = Summarizer::new(Arc::new(JudgingLlm)).with_concurrency(2);
    let generator = Generator::new(retriever, summarizer);

    let intermediate = dir.path().join("blog_finetune.json");
    generator
        .run(&[transcript_path], "blog", &intermediate)
        .await
        .unwrap();

    // One metadata record, two example records; the first example carries
    // the aggregated memory from the blog chunk.
    let records: Vec<DatasetRecord> =
        serde_json::from_str(&std::fs::read_to_string(&intermediate).unwrap()).unwrap();
    assert_eq!(records.len(), 3);
    match &records[1] {
        DatasetRecord::Example(example) => {
            let memories = example.similar_memories.as_deref().unwrap();
            assert!(memories.starts_with("from 2020-06-01: \n I believe focus"));
        },
        other => panic!("expected example record, got {other:?}"),
    }

    // Both exchanges were embedded and persisted for future runs.
    assert!(store.docs.lock().unwrap().len() >= 3);

    let packed = dir.path().join("blog_openai.jsonl");
    let windows = pack_dataset(&intermediate, &packed, 4096).unwrap();
    assert_eq!(windows, 2);

    let raw = std::fs::read_to_string(&packed).unwrap();
    let last_line = raw.lines().last().unwrap();
    let value: serde_json::Value = serde_json::from_str(last_line).unwrap();
    let messages = value["messages"].as_array().unwrap();

    assert!(
        messages[0]["content"]
            .as_str()
            .unwrap()
            .starts_with("Pat Host is interviewing you, Sam Guest.")
    );
    // The second window ends on the second answer and, with this budget,
    // carries the first exchange as prior context.
    assert_eq!(messages.last().unwrap()["content"], "Ruthless scheduling.");
    assert!(
        messages
            .iter()
            .any(|m| m["content"] == "What matters most in your work?")
    );
}
