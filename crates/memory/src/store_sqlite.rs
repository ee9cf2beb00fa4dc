/// SQLite-backed embedding store. Vectors are little-endian f32 blobs;
/// similarity is cosine, computed over the collection's rows in ranked order.
use std::path::Path;

use {
    anyhow::Result,
    async_trait::async_trait,
    sqlx::{
        Row, SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
};

use crate::store::{MemoryStore, QueryHit, StoredDocument};

pub struct SqliteMemoryStore {
    pool: SqlitePool,
}

impl SqliteMemoryStore {
    /// Open (or create) the store at `path` and run the schema.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS embeddings (
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                embedding  BLOB NOT NULL,
                document   TEXT NOT NULL,
                metadata   TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn upsert(&self, collection: &str, doc: &StoredDocument) -> Result<()> {
        let blob = vector_to_blob(&doc.embedding);
        let metadata = serde_json::to_string(&doc.metadata)?;

        sqlx::query(
            "INSERT INTO embeddings (collection, id, embedding, document, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (collection, id) DO UPDATE SET
                 embedding = excluded.embedding,
                 document  = excluded.document,
                 metadata  = excluded.metadata",
        )
        .bind(collection)
        .bind(&doc.id)
        .bind(blob)
        .bind(&doc.document)
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_embedding(&self, collection: &str, id: &str) -> Result<Option<Vec<f32>>> {
        let row = sqlx::query("SELECT embedding FROM embeddings WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let blob: Vec<u8> = row.try_get("embedding")?;
                Ok(Some(blob_to_vector(&blob)))
            },
            None => Ok(None),
        }
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<QueryHit>> {
        // Brute-force scan in insertion order; the stable sort below keeps
        // that order for equal scores.
        let rows = sqlx::query(
            "SELECT embedding, document, metadata FROM embeddings
             WHERE collection = ?1 ORDER BY rowid",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let blob: Vec<u8> = row.try_get("embedding")?;
            let document: String = row.try_get("document")?;
            let metadata: String = row.try_get("metadata")?;
            let stored = blob_to_vector(&blob);
            hits.push(QueryHit {
                document,
                metadata: serde_json::from_str(&metadata)?,
                score: cosine_similarity(embedding, &stored),
            });
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }
}
