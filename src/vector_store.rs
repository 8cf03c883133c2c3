//! Durable (id, text, embedding, doc_id) records with nearest-neighbour
//! lookup for the vectordb service.
//!
//! Records are keyed by the composite id `{doc_id}_{chunk_index}` and
//! written with INSERT OR REPLACE, so re-storing the same chunk under
//! retry overwrites instead of duplicating. Search is a cosine-distance
//! scan over all rows; the index algorithm proper is outside this
//! service's contract, which only promises ranked results.

use std::path::Path;

use tokio_rusqlite::Connection;

use crate::error::PipelineError;
use crate::types::ScoredChunk;

#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Connection,
}

impl SqliteVectorStore {
    /// Opens (or creates) the store at `path` and ensures the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let conn = Connection::open(path)
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))?;
        Self::init(conn).await
    }

    /// In-memory store, used by tests.
    pub async fn open_in_memory() -> Result<Self, PipelineError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, PipelineError> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS vectors (
                    id TEXT PRIMARY KEY,
                    doc_id INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    embedding TEXT NOT NULL
                )",
                [],
            )
            .map_err(tokio_rusqlite::Error::Rusqlite)?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS vectors_doc_id ON vectors (doc_id)",
                [],
            )
            .map_err(tokio_rusqlite::Error::Rusqlite)?;
            Ok(())
        })
        .await
        .map_err(|err| PipelineError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    /// Upserts one record per chunk under the composite id
    /// `{doc_id}_{index}` and returns the number of records written.
    pub async fn store(
        &self,
        doc_id: i64,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, PipelineError> {
        if chunks.len() != embeddings.len() {
            return Err(PipelineError::InvalidRequest(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut rows = Vec::with_capacity(chunks.len());
        for (index, (chunk, embedding)) in chunks.iter().zip(embeddings).enumerate() {
            let encoded = serde_json::to_string(embedding)
                .map_err(|err| PipelineError::Storage(err.to_string()))?;
            rows.push((format!("{doc_id}_{index}"), chunk.clone(), encoded));
        }

        let count = rows.len();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(tokio_rusqlite::Error::Rusqlite)?;
                for (id, content, embedding) in rows {
                    tx.execute(
                        "INSERT OR REPLACE INTO vectors (id, doc_id, content, embedding)
                         VALUES (?1, ?2, ?3, ?4)",
                        (&id, doc_id, &content, &embedding),
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                }
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))?;
        Ok(count)
    }

    /// Returns up to `top_k` chunks ranked by ascending cosine distance to
    /// `embedding`. The distance is reported as the score, unmodified.
    pub async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, PipelineError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query = embedding.to_vec();

        let mut scored = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT doc_id, content, embedding FROM vectors")
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut scored = Vec::new();
                for row in rows {
                    let (doc_id, content, encoded) =
                        row.map_err(tokio_rusqlite::Error::Rusqlite)?;
                    let stored: Vec<f32> = match serde_json::from_str(&encoded) {
                        Ok(vector) => vector,
                        // A row written by an incompatible embedder cannot
                        // be ranked; skip it rather than fail the query.
                        Err(_) => continue,
                    };
                    scored.push(ScoredChunk {
                        text: content,
                        score: cosine_distance(&query, &stored),
                        doc_id,
                    });
                }
                Ok(scored)
            })
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))?;

        scored.sort_by(|a, b| a.score.total_cmp(&b.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Removes every record whose metadata `doc_id` matches and returns
    /// the number removed. Zero matches is not an error.
    pub async fn delete_by_document(&self, doc_id: i64) -> Result<usize, PipelineError> {
        self.conn
            .call(move |conn| {
                let deleted = conn
                    .execute("DELETE FROM vectors WHERE doc_id = ?1", [doc_id])
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(deleted)
            })
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))
    }

    /// Total number of stored records.
    pub async fn count(&self) -> Result<usize, PipelineError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM vectors", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))
    }
}

/// Cosine distance (1 - cosine similarity). Mismatched or zero-norm
/// vectors rank last.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::MAX;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return f32::MAX;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}
