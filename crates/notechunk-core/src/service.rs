//! Note embedding orchestration.
//!
//! [`NoteEmbeddingService`] keeps a note's stored chunk set in step with
//! its content: chunk, embed in one batch, then replace the note's
//! chunks in the store.
//!
//! The replace goes through [`NoteStore::replace_chunks`]; whether the
//! delete and insert appear atomic is the store's responsibility.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chunk::{prepare_note, ChunkingConfig};
use crate::embedding::EmbeddingClient;
use crate::error::{Error, Result};
use crate::models::{
    EmbedAllSummary, EmbeddedChunk, Note, NoteFailure, NoteUpdate, ReindexOutcome, StoredChunk,
};
use crate::pipeline::embed_chunks;
use crate::store::NoteStore;

pub const MIN_CHUNK_SIZE: usize = 500;
pub const MAX_CHUNK_SIZE: usize = 3000;

/// Reject chunk sizes outside `[MIN_CHUNK_SIZE, MAX_CHUNK_SIZE]`.
pub fn validate_chunk_size(chunk_size: usize) -> Result<usize> {
    if (MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
        Ok(chunk_size)
    } else {
        Err(Error::Validation(format!(
            "chunk_size must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE}, got {chunk_size}"
        )))
    }
}

pub struct NoteEmbeddingService {
    store: Arc<dyn NoteStore>,
    client: EmbeddingClient,
    chunking: ChunkingConfig,
}

impl NoteEmbeddingService {
    /// `chunking` supplies the overlap, separator, and the chunk size used
    /// by [`best_effort_reindex`](Self::best_effort_reindex).
    pub fn new(store: Arc<dyn NoteStore>, client: EmbeddingClient, chunking: ChunkingConfig) -> Self {
        Self {
            store,
            client,
            chunking,
        }
    }

    /// Chunk, embed, and store one note, replacing its previous chunks.
    ///
    /// Blank content returns an empty list and leaves storage untouched.
    /// Ownership is not checked here; see
    /// [`embed_note_for_user`](Self::embed_note_for_user).
    pub async fn embed_note(
        &self,
        note_id: &str,
        user_id: &str,
        title: &str,
        content: &str,
        chunk_size: usize,
    ) -> Result<Vec<EmbeddedChunk>> {
        let config = self
            .chunking
            .with_target_size(validate_chunk_size(chunk_size)?)?;

        let chunks = prepare_note(title, content, &config);
        if chunks.is_empty() {
            debug!(note_id, "note has no content, skipping embedding");
            return Ok(Vec::new());
        }

        let embedded = embed_chunks(&self.client, chunks).await?;
        self.store.replace_chunks(note_id, user_id, &embedded).await?;

        debug!(note_id, chunks = embedded.len(), "note embedded");
        Ok(embedded)
    }

    /// Load a note, verify `user_id` owns it, then embed it.
    ///
    /// Both checks run before any provider call.
    pub async fn embed_note_for_user(
        &self,
        note_id: &str,
        user_id: &str,
        chunk_size: usize,
    ) -> Result<Vec<EmbeddedChunk>> {
        validate_chunk_size(chunk_size)?;
        let note = self.owned_note(note_id, user_id).await?;
        self.embed_note(&note.id, user_id, &note.title, &note.content, chunk_size)
            .await
    }

    /// Re-embed every note owned by `user_id`.
    ///
    /// Each note is processed independently: a failure is recorded in the
    /// summary and the loop moves on. Only a failure to list the notes
    /// (or an invalid `chunk_size`) is returned as an error.
    pub async fn embed_all_notes(&self, user_id: &str, chunk_size: usize) -> Result<EmbedAllSummary> {
        validate_chunk_size(chunk_size)?;
        let notes = self.store.list_notes(user_id).await?;

        let mut summary = EmbedAllSummary {
            total_notes: notes.len(),
            ..Default::default()
        };

        for note in &notes {
            match self
                .embed_note(&note.id, user_id, &note.title, &note.content, chunk_size)
                .await
            {
                Ok(chunks) => summary.total_chunks += chunks.len(),
                Err(e) => {
                    warn!(note_id = %note.id, error = %e, "failed to embed note");
                    summary.failed_notes += 1;
                    summary.errors.push(NoteFailure {
                        note_id: note.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            user_id,
            total_notes = summary.total_notes,
            total_chunks = summary.total_chunks,
            failed_notes = summary.failed_notes,
            "embedded all notes"
        );
        Ok(summary)
    }

    /// Reindex a note after it was written, never failing the caller.
    ///
    /// Uses the configured chunk size. Errors are logged at `warn` and
    /// returned as [`ReindexOutcome::Failed`].
    pub async fn best_effort_reindex(&self, note: &Note) -> ReindexOutcome {
        let result = self
            .embed_note(
                &note.id,
                &note.user_id,
                &note.title,
                &note.content,
                self.chunking.target_size(),
            )
            .await;

        match result {
            Ok(chunks) if chunks.is_empty() => ReindexOutcome::Skipped,
            Ok(chunks) => ReindexOutcome::Indexed(chunks.len()),
            Err(e) => {
                warn!(note_id = %note.id, error = %e, "best-effort reindex failed");
                ReindexOutcome::Failed(e.to_string())
            }
        }
    }

    /// Apply `update` to a note the user owns, then reindex it
    /// best-effort.
    ///
    /// The write stands even if reindexing fails; the outcome says what
    /// happened to the chunks.
    pub async fn update_note(
        &self,
        note_id: &str,
        user_id: &str,
        update: NoteUpdate,
    ) -> Result<(Note, ReindexOutcome)> {
        if update.is_empty() {
            return Err(Error::Validation("no fields to update".to_string()));
        }
        let mut note = self.owned_note(note_id, user_id).await?;
        if let Some(title) = update.title {
            note.title = title;
        }
        if let Some(content) = update.content {
            note.content = content;
        }
        self.store.upsert_note(&note).await?;

        let outcome = self.best_effort_reindex(&note).await;
        info!(note_id, ?outcome, "note updated");
        Ok((note, outcome))
    }

    /// Delete a note the user owns. Its chunks go with it.
    pub async fn delete_note(&self, note_id: &str, user_id: &str) -> Result<()> {
        self.owned_note(note_id, user_id).await?;
        if !self.store.delete_note(note_id).await? {
            return Err(Error::NotFound(note_id.to_string()));
        }
        info!(note_id, "note deleted");
        Ok(())
    }

    /// Stored chunks of a note the user owns, in index order.
    pub async fn note_chunks(&self, note_id: &str, user_id: &str) -> Result<Vec<StoredChunk>> {
        self.owned_note(note_id, user_id).await?;
        Ok(self.store.list_chunks(note_id).await?)
    }

    async fn owned_note(&self, note_id: &str, user_id: &str) -> Result<Note> {
        let note = self
            .store
            .get_note(note_id)
            .await?
            .ok_or_else(|| Error::NotFound(note_id.to_string()))?;
        if note.user_id != user_id {
            return Err(Error::Forbidden(format!(
                "note {note_id} is not owned by the requesting user"
            )));
        }
        Ok(note)
    }
}
