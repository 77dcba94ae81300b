//! Storage abstraction for notes and their embedded chunks.
//!
//! The [`NoteStore`] trait is the storage collaborator the services talk
//! to. It owns persistence and similarity ranking; core code only hands
//! it records and query vectors.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{EmbeddedChunk, Note, StoredChunk};

/// A ranked row returned by [`NoteStore::similarity_search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarChunk {
    pub id: String,
    pub note_id: String,
    pub content: String,
    pub similarity: f64,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// Abstract storage backend for notes and note chunks.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_note`](NoteStore::upsert_note) | Insert or update a note |
/// | [`get_note`](NoteStore::get_note) | Fetch one note by id |
/// | [`list_notes`](NoteStore::list_notes) | All notes owned by a user |
/// | [`delete_note`](NoteStore::delete_note) | Remove a note and its chunks |
/// | [`delete_chunks`](NoteStore::delete_chunks) | Remove every chunk of a note |
/// | [`insert_chunks`](NoteStore::insert_chunks) | Persist embedded chunks for a note |
/// | [`replace_chunks`](NoteStore::replace_chunks) | Delete then insert, per note |
/// | [`list_chunks`](NoteStore::list_chunks) | Stored chunks of a note, by index |
/// | [`similarity_search`](NoteStore::similarity_search) | Rank a user's chunks against a vector |
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn upsert_note(&self, note: &Note) -> Result<()>;

    async fn get_note(&self, note_id: &str) -> Result<Option<Note>>;

    async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>>;

    /// Delete a note together with all of its chunks. Returns `false`
    /// when no such note existed.
    async fn delete_note(&self, note_id: &str) -> Result<bool>;

    async fn delete_chunks(&self, note_id: &str) -> Result<()>;

    async fn insert_chunks(
        &self,
        note_id: &str,
        user_id: &str,
        chunks: &[EmbeddedChunk],
    ) -> Result<()>;

    /// Replace all chunks of a note.
    ///
    /// The default runs [`delete_chunks`](NoteStore::delete_chunks) then
    /// [`insert_chunks`](NoteStore::insert_chunks); backends should
    /// override it to make the swap atomic per note.
    async fn replace_chunks(
        &self,
        note_id: &str,
        user_id: &str,
        chunks: &[EmbeddedChunk],
    ) -> Result<()> {
        self.delete_chunks(note_id).await?;
        self.insert_chunks(note_id, user_id, chunks).await
    }

    /// Stored chunks for a note, ordered by `chunk_index`.
    async fn list_chunks(&self, note_id: &str) -> Result<Vec<StoredChunk>>;

    /// Up to `limit` of the user's chunks, most similar first.
    ///
    /// Fails if a stored vector's length differs from `query_vector`'s.
    async fn similarity_search(
        &self,
        user_id: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SimilarChunk>>;
}
