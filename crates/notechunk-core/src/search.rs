//! Semantic search over a user's note chunks.
//!
//! The query is embedded with the same [`EmbeddingClient`] used for
//! indexing, and ranking is delegated to
//! [`NoteStore::similarity_search`]. Results keep the store's order.

use std::sync::Arc;

use tracing::debug;

use crate::embedding::EmbeddingClient;
use crate::error::{Error, Result};
use crate::models::SearchMatch;
use crate::store::NoteStore;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Resolve a caller-supplied limit: `None` means [`DEFAULT_LIMIT`],
/// anything outside `1..=MAX_LIMIT` is rejected.
pub fn validate_limit(limit: Option<usize>) -> Result<usize> {
    match limit {
        None => Ok(DEFAULT_LIMIT),
        Some(n) if (1..=MAX_LIMIT).contains(&n) => Ok(n),
        Some(n) => Err(Error::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {n}"
        ))),
    }
}

pub struct SearchService {
    store: Arc<dyn NoteStore>,
    client: EmbeddingClient,
}

impl SearchService {
    pub fn new(store: Arc<dyn NoteStore>, client: EmbeddingClient) -> Self {
        Self { store, client }
    }

    /// Rank `user_id`'s chunks against `query`, returning at most `limit`.
    ///
    /// A blank query fails with [`Error::Validation`] before the provider
    /// is called. No similarity threshold is applied.
    pub async fn search(&self, user_id: &str, query: &str, limit: usize) -> Result<Vec<SearchMatch>> {
        let query_vector = self.client.embed_one(query).await?;
        let rows = self
            .store
            .similarity_search(user_id, &query_vector, limit)
            .await?;

        debug!(user_id, results = rows.len(), "similarity search done");

        Ok(rows
            .into_iter()
            .map(|row| SearchMatch {
                chunk_id: row.id,
                note_id: row.note_id,
                content: row.content,
                similarity: row.similarity,
                chunk_index: row.chunk_index,
                total_chunks: row.total_chunks,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::{EmbeddedChunk, Note, StoredChunk};
    use crate::store::SimilarChunk;
    use crate::testing::FakeProvider;

    /// Returns fixed rows in a deliberately non-sorted order.
    struct ScriptedStore {
        rows: Vec<SimilarChunk>,
    }

    fn row(id: &str, similarity: f64) -> SimilarChunk {
        SimilarChunk {
            id: id.to_string(),
            note_id: format!("note-{id}"),
            content: format!("content {id}"),
            similarity,
            chunk_index: 0,
            total_chunks: 1,
        }
    }

    #[async_trait]
    impl NoteStore for ScriptedStore {
        async fn upsert_note(&self, _note: &Note) -> anyhow::Result<()> {
            Ok(())
        }
        async fn get_note(&self, _note_id: &str) -> anyhow::Result<Option<Note>> {
            Ok(None)
        }
        async fn list_notes(&self, _user_id: &str) -> anyhow::Result<Vec<Note>> {
            Ok(Vec::new())
        }
        async fn delete_note(&self, _note_id: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn delete_chunks(&self, _note_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn insert_chunks(
            &self,
            _note_id: &str,
            _user_id: &str,
            _chunks: &[EmbeddedChunk],
        ) -> anyhow::Result<()> {
            Ok(())
        }
        async fn list_chunks(&self, _note_id: &str) -> anyhow::Result<Vec<StoredChunk>> {
            Ok(Vec::new())
        }
        async fn similarity_search(
            &self,
            _user_id: &str,
            _query_vector: &[f32],
            limit: usize,
        ) -> anyhow::Result<Vec<SimilarChunk>> {
            Ok(self.rows.iter().take(limit).cloned().collect())
        }
    }

    fn service(provider: Arc<FakeProvider>, rows: Vec<SimilarChunk>) -> SearchService {
        SearchService::new(Arc::new(ScriptedStore { rows }), EmbeddingClient::new(provider))
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_before_provider_call() {
        let provider = Arc::new(FakeProvider::new());
        let svc = service(provider.clone(), vec![row("a", 0.9)]);
        let err = svc.search("u1", "", 10).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_results_keep_store_order_and_shape() {
        let provider = Arc::new(FakeProvider::new());
        let svc = service(provider, vec![row("a", 0.2), row("b", 0.9), row("c", 0.5)]);

        let results = svc.search("u1", "anything", 10).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.chunk_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(results[1].note_id, "note-b");
        assert_eq!(results[1].content, "content b");
        assert_eq!(results[1].similarity, 0.9);
    }

    #[tokio::test]
    async fn test_limit_is_passed_to_store() {
        let provider = Arc::new(FakeProvider::new());
        let svc = service(provider, vec![row("a", 0.9), row("b", 0.8), row("c", 0.7)]);
        let results = svc.search("u1", "query", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit(None).unwrap(), DEFAULT_LIMIT);
        assert_eq!(validate_limit(Some(1)).unwrap(), 1);
        assert_eq!(validate_limit(Some(100)).unwrap(), 100);
        assert!(matches!(validate_limit(Some(0)), Err(Error::Validation(_))));
        assert!(matches!(validate_limit(Some(101)), Err(Error::Validation(_))));
    }
}
