//! Memory retrieval: questions → embedded (with a deduplicating cache) →
//! nearest-neighbor search over past interviews and blog chunks in SQLite.

pub mod embeddings;
pub mod embeddings_openai;
pub mod ingest;
pub mod retriever;
pub mod store;
pub mod store_sqlite;
