//! In-memory [`NoteStore`] implementation for tests and embedding.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock`. Similarity search
//! is brute-force cosine over the user's stored vectors.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::models::{EmbeddedChunk, Note, StoredChunk};

use super::{NoteStore, SimilarChunk};

struct StoredVector {
    chunk: StoredChunk,
    vector: Vec<f32>,
}

/// In-memory note store.
#[derive(Default)]
pub struct InMemoryNoteStore {
    notes: RwLock<HashMap<String, Note>>,
    chunks: RwLock<Vec<StoredVector>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn notes(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Note>>> {
        self.notes.read().map_err(|_| anyhow!("note map lock poisoned"))
    }

    fn notes_mut(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Note>>> {
        self.notes.write().map_err(|_| anyhow!("note map lock poisoned"))
    }

    fn chunks(&self) -> Result<RwLockReadGuard<'_, Vec<StoredVector>>> {
        self.chunks.read().map_err(|_| anyhow!("chunk list lock poisoned"))
    }

    fn chunks_mut(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredVector>>> {
        self.chunks.write().map_err(|_| anyhow!("chunk list lock poisoned"))
    }
}

fn to_stored(note_id: &str, user_id: &str, chunks: &[EmbeddedChunk]) -> Vec<StoredVector> {
    chunks
        .iter()
        .map(|e| StoredVector {
            chunk: StoredChunk {
                id: Uuid::new_v4().to_string(),
                note_id: note_id.to_string(),
                user_id: user_id.to_string(),
                chunk_index: e.chunk.chunk_index(),
                total_chunks: e.chunk.total_chunks(),
                content: e.chunk.content().to_string(),
            },
            vector: e.embedding.clone(),
        })
        .collect()
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn upsert_note(&self, note: &Note) -> Result<()> {
        self.notes_mut()?.insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn get_note(&self, note_id: &str) -> Result<Option<Note>> {
        Ok(self.notes()?.get(note_id).cloned())
    }

    async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .notes()?
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(notes)
    }

    async fn delete_note(&self, note_id: &str) -> Result<bool> {
        let mut chunks = self.chunks_mut()?;
        let existed = self.notes_mut()?.remove(note_id).is_some();
        chunks.retain(|sv| sv.chunk.note_id != note_id);
        Ok(existed)
    }

    async fn delete_chunks(&self, note_id: &str) -> Result<()> {
        self.chunks_mut()?.retain(|sv| sv.chunk.note_id != note_id);
        Ok(())
    }

    async fn insert_chunks(
        &self,
        note_id: &str,
        user_id: &str,
        chunks: &[EmbeddedChunk],
    ) -> Result<()> {
        self.chunks_mut()?.extend(to_stored(note_id, user_id, chunks));
        Ok(())
    }

    async fn replace_chunks(
        &self,
        note_id: &str,
        user_id: &str,
        chunks: &[EmbeddedChunk],
    ) -> Result<()> {
        // One write guard covers both steps.
        let mut stored = self.chunks_mut()?;
        stored.retain(|sv| sv.chunk.note_id != note_id);
        stored.extend(to_stored(note_id, user_id, chunks));
        Ok(())
    }

    async fn list_chunks(&self, note_id: &str) -> Result<Vec<StoredChunk>> {
        let mut chunks: Vec<StoredChunk> = self
            .chunks()?
            .iter()
            .filter(|sv| sv.chunk.note_id == note_id)
            .map(|sv| sv.chunk.clone())
            .collect();
        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks)
    }

    async fn similarity_search(
        &self,
        user_id: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SimilarChunk>> {
        let mut candidates = self
            .chunks()?
            .iter()
            .filter(|sv| sv.chunk.user_id == user_id)
            .map(|sv| {
                let similarity = cosine_similarity(query_vector, &sv.vector)
                    .with_context(|| format!("chunk {} of note {}", sv.chunk.id, sv.chunk.note_id))?;
                Ok(SimilarChunk {
                    id: sv.chunk.id.clone(),
                    note_id: sv.chunk.note_id.clone(),
                    content: sv.chunk.content.clone(),
                    similarity,
                    chunk_index: sv.chunk.chunk_index,
                    total_chunks: sv.chunk.total_chunks,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{chunk_text, ChunkingConfig};
    use crate::testing::letter_vector;

    fn embedded(text: &str) -> Vec<EmbeddedChunk> {
        let config = ChunkingConfig::new(10, 0, "|").unwrap();
        chunk_text(text, "", &config)
            .into_iter()
            .map(|chunk| EmbeddedChunk {
                embedding: letter_vector(chunk.content()),
                chunk,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_replace_chunks_drops_previous_set() {
        let store = InMemoryNoteStore::new();
        store.replace_chunks("n1", "u1", &embedded("AAAAA|BBBBB|CCCCC")).await.unwrap();
        store.replace_chunks("n2", "u1", &embedded("ZZZZZ")).await.unwrap();
        store.replace_chunks("n1", "u1", &embedded("DDDDD")).await.unwrap();

        let n1 = store.list_chunks("n1").await.unwrap();
        assert_eq!(n1.len(), 1);
        assert_eq!(n1[0].content, "DDDDD");
        assert_eq!(store.list_chunks("n2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_similarity_search_scoped_to_user_and_limited() {
        let store = InMemoryNoteStore::new();
        store.replace_chunks("n1", "u1", &embedded("AAAAA|BBBBB|CCCCC")).await.unwrap();
        store.replace_chunks("n2", "u2", &embedded("BBBBB")).await.unwrap();

        let hits = store
            .similarity_search("u1", &letter_vector("bbb"), 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].note_id, "n1");
        assert_eq!(hits[0].content, "BBBBB");
        assert!(hits[0].similarity >= hits[1].similarity);
    }

    #[tokio::test]
    async fn test_delete_note_removes_its_chunks() {
        let store = InMemoryNoteStore::new();
        let note = Note {
            id: "n1".to_string(),
            user_id: "u1".to_string(),
            title: String::new(),
            content: "AAAAA|BBBBB".to_string(),
        };
        store.upsert_note(&note).await.unwrap();
        store.replace_chunks("n1", "u1", &embedded("AAAAA|BBBBB")).await.unwrap();
        store.replace_chunks("n2", "u1", &embedded("CCCCC")).await.unwrap();

        assert!(store.delete_note("n1").await.unwrap());
        assert!(store.get_note("n1").await.unwrap().is_none());
        assert!(store.list_chunks("n1").await.unwrap().is_empty());
        assert_eq!(store.list_chunks("n2").await.unwrap().len(), 1);
        assert!(!store.delete_note("n1").await.unwrap());
    }

    #[tokio::test]
    async fn test_similarity_search_fails_on_foreign_vector_length() {
        let store = InMemoryNoteStore::new();
        store.replace_chunks("n1", "u1", &embedded("AAAAA")).await.unwrap();

        let err = store
            .similarity_search("u1", &[1.0, 0.0], 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("n1"));
    }
}
