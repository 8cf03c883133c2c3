//! Durable record of each uploaded document and its processing status.

use std::path::Path;

use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;

use crate::error::PipelineError;
use crate::types::{Document, DocumentStatus};

/// SQLite-backed store of document records.
///
/// Each record tracks one upload's lifecycle: created in `processing`,
/// moved exactly once to `completed` or `failed` by the ingestion
/// pipeline. All operations are atomic per record; ids are assigned by
/// the database and are monotonic.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
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
                "CREATE TABLE IF NOT EXISTS documents (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    filename TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )",
                [],
            )
            .map_err(tokio_rusqlite::Error::Rusqlite)?;
            Ok(())
        })
        .await
        .map_err(|err| PipelineError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    /// Inserts a new record in `processing` state and returns its id.
    pub async fn create(&self, filename: &str) -> Result<i64, PipelineError> {
        let filename = filename.to_string();
        let created_at = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO documents (filename, status, created_at) VALUES (?1, ?2, ?3)",
                    (
                        &filename,
                        DocumentStatus::Processing.as_str(),
                        &created_at,
                    ),
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))
    }

    /// Updates a record's status. Unknown ids are a no-op so a status
    /// update on an already-failed path cannot mask the original error.
    pub async fn set_status(
        &self,
        id: i64,
        status: DocumentStatus,
    ) -> Result<(), PipelineError> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE documents SET status = ?1 WHERE id = ?2",
                    (status.as_str(), id),
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))
    }

    /// Returns all document records in insertion order.
    pub async fn list(&self) -> Result<Vec<Document>, PipelineError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, filename, status, created_at FROM documents ORDER BY id",
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map([], |row| {
                        let status: String = row.get(2)?;
                        let created_at: String = row.get(3)?;
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            status,
                            created_at,
                        ))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut documents = Vec::new();
                for row in rows {
                    let (id, filename, status, created_at) =
                        row.map_err(tokio_rusqlite::Error::Rusqlite)?;
                    documents.push(Document {
                        id,
                        filename,
                        status: DocumentStatus::parse(&status)
                            .unwrap_or(DocumentStatus::Failed),
                        created_at: created_at
                            .parse::<DateTime<Utc>>()
                            .unwrap_or_else(|_| Utc::now()),
                    });
                }
                Ok(documents)
            })
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))
    }

    /// Removes a record. Deleting an unknown id is a no-op.
    pub async fn delete(&self, id: i64) -> Result<(), PipelineError> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM documents WHERE id = ?1", [id])
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|err| PipelineError::Storage(err.to_string()))
    }
}
