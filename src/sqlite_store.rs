//! SQLite-backed [`NoteStore`] implementation.
//!
//! Vectors are stored as little-endian f32 BLOBs in `note_chunks` and
//! ranked by brute-force cosine similarity over the requesting user's
//! rows. A stored vector whose length differs from the query's fails the
//! search instead of being ranked.
//!
//! Deleting a note relies on `ON DELETE CASCADE`, so the pool must be
//! opened with foreign keys enabled (see [`crate::db::connect`]).

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use notechunk_core::embedding::{blob_to_vector, cosine_similarity, vector_to_blob};
use notechunk_core::models::{EmbeddedChunk, Note, StoredChunk};
use notechunk_core::store::{NoteStore, SimilarChunk};

pub struct SqliteNoteStore {
    pool: SqlitePool,
}

impl SqliteNoteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_note(row: &SqliteRow) -> Note {
    Note {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
    }
}

async fn insert_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    note_id: &str,
    user_id: &str,
    chunks: &[EmbeddedChunk],
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    for embedded in chunks {
        sqlx::query(
            r#"
            INSERT INTO note_chunks (id, note_id, user_id, chunk_index, total_chunks,
                                     content, embedding, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(note_id)
        .bind(user_id)
        .bind(embedded.chunk.chunk_index() as i64)
        .bind(embedded.chunk.total_chunks() as i64)
        .bind(embedded.chunk.content())
        .bind(vector_to_blob(&embedded.embedding))
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn upsert_note(&self, note: &Note) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO notes (id, user_id, title, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&note.id)
        .bind(&note.user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_note(&self, note_id: &str) -> Result<Option<Note>> {
        let row = sqlx::query("SELECT id, user_id, title, content FROM notes WHERE id = ?")
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_note))
    }

    async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, content FROM notes WHERE user_id = ? ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_note).collect())
    }

    async fn delete_note(&self, note_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_chunks(&self, note_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM note_chunks WHERE note_id = ?")
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_chunks(
        &self,
        note_id: &str,
        user_id: &str,
        chunks: &[EmbeddedChunk],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_in_tx(&mut tx, note_id, user_id, chunks).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_chunks(
        &self,
        note_id: &str,
        user_id: &str,
        chunks: &[EmbeddedChunk],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM note_chunks WHERE note_id = ?")
            .bind(note_id)
            .execute(&mut *tx)
            .await?;
        insert_in_tx(&mut tx, note_id, user_id, chunks).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_chunks(&self, note_id: &str) -> Result<Vec<StoredChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT id, note_id, user_id, chunk_index, total_chunks, content
            FROM note_chunks
            WHERE note_id = ?
            ORDER BY chunk_index
            "#,
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| StoredChunk {
                id: row.get("id"),
                note_id: row.get("note_id"),
                user_id: row.get("user_id"),
                chunk_index: row.get::<i64, _>("chunk_index") as usize,
                total_chunks: row.get::<i64, _>("total_chunks") as usize,
                content: row.get("content"),
            })
            .collect())
    }

    async fn similarity_search(
        &self,
        user_id: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SimilarChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT id, note_id, chunk_index, total_chunks, content, embedding
            FROM note_chunks
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                let blob: Vec<u8> = row.get("embedding");
                let similarity = blob_to_vector(&blob, query_vector.len())
                    .and_then(|v| cosine_similarity(query_vector, &v))
                    .with_context(|| format!("Invalid embedding stored for chunk {id}"))?;
                Ok(SimilarChunk {
                    id,
                    note_id: row.get("note_id"),
                    content: row.get("content"),
                    similarity,
                    chunk_index: row.get::<i64, _>("chunk_index") as usize,
                    total_chunks: row.get::<i64, _>("total_chunks") as usize,
                })
            })
            .collect::<Result<Vec<SimilarChunk>>>()?;

        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);
        Ok(candidates)
    }
}
