//! Data types that flow through the chunking, embedding, and search
//! pipeline.

use serde::{Deserialize, Serialize};

/// A note as owned by the storage collaborator. Core code reads it and
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
}

/// Fields to change on an existing note. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// One segment of a source text, produced by [`chunk_text`](crate::chunk::chunk_text).
///
/// Fields are private: a `Chunk` only comes out of the chunker's
/// finalization step, which guarantees that `content` is non-blank,
/// `chunk_index < total_chunks`, and `total_chunks` equals the length of
/// the sequence it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    content: String,
    title: String,
    chunk_index: usize,
    total_chunks: usize,
}

impl Chunk {
    pub(crate) fn new(content: String, title: &str, chunk_index: usize, total_chunks: usize) -> Self {
        debug_assert!(chunk_index < total_chunks);
        Self {
            content,
            title: title.to_string(),
            chunk_index,
            total_chunks,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }
}

/// A [`Chunk`] paired with its embedding vector, ready for storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A chunk as persisted by the note store (vector omitted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub note_id: String,
    pub user_id: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub content: String,
}

/// One ranked result of a semantic search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    pub chunk_id: String,
    pub note_id: String,
    pub content: String,
    pub similarity: f64,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A single note that failed during [`embed_all_notes`](crate::service::NoteEmbeddingService::embed_all_notes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteFailure {
    pub note_id: String,
    pub error: String,
}

/// Result of re-embedding every note of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbedAllSummary {
    pub total_notes: usize,
    pub total_chunks: usize,
    pub failed_notes: usize,
    pub errors: Vec<NoteFailure>,
}

/// Outcome of a best-effort reindex after a note write.
#[derive(Debug, Clone, PartialEq)]
pub enum ReindexOutcome {
    /// The note was re-embedded into this many chunks.
    Indexed(usize),
    /// The note had no content to embed; storage was left untouched.
    Skipped,
    /// Reindexing failed; the failure was logged and swallowed.
    Failed(String),
}
