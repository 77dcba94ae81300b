//! Implementations of the `notechunk` subcommands.
//!
//! Each runner opens the database, wires the core services to the
//! SQLite store and the configured provider, and prints a short report.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;
use uuid::Uuid;

use notechunk_core::chunk::chunk_text;
use notechunk_core::embedding::{EmbeddingClient, EmbeddingProvider};
use notechunk_core::models::{Note, NoteUpdate, ReindexOutcome};
use notechunk_core::search::{validate_limit, SearchService};
use notechunk_core::service::NoteEmbeddingService;
use notechunk_core::store::NoteStore;

use crate::config::Config;
use crate::db;
use crate::embedding::{self, DisabledProvider};
use crate::migrate;
use crate::sqlite_store::SqliteNoteStore;

/// Services wired to one database pool.
pub struct App {
    pub store: Arc<SqliteNoteStore>,
    pub notes: NoteEmbeddingService,
    pub search: SearchService,
}

impl App {
    pub fn new(
        config: &Config,
        store: Arc<SqliteNoteStore>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let client = EmbeddingClient::new(provider);
        let chunking = config.chunking.to_core()?;
        Ok(Self {
            notes: NoteEmbeddingService::new(store.clone(), client.clone(), chunking),
            search: SearchService::new(store.clone(), client),
            store,
        })
    }

    /// Connect, migrate, and build the configured provider.
    pub async fn open(config: &Config) -> Result<Self> {
        let provider = embedding::create_provider(&config.embedding)?;
        Self::open_with_provider(config, provider).await
    }

    pub async fn open_with_provider(
        config: &Config,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let pool = db::connect(&config.db).await?;
        migrate::run_migrations(&pool).await?;
        Self::new(config, Arc::new(SqliteNoteStore::new(pool)), provider)
    }

    pub async fn close(self) {
        self.store.pool().close().await;
    }
}

pub async fn run_init(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db).await?;
    migrate::run_migrations(&pool).await?;
    pool.close().await;
    println!("Database initialized at {}", config.db.path.display());
    Ok(())
}

/// Store a note, then reindex it best-effort. The note write succeeds
/// even when embedding is unavailable.
pub async fn run_add_note(config: &Config, user_id: &str, title: &str, content: &str) -> Result<()> {
    let app = App::open_with_provider(config, provider_or_disabled(config)).await?;

    let note = Note {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
    };
    app.store.upsert_note(&note).await.context("Failed to store note")?;

    println!("note {}", note.id);
    print_outcome(&app.notes.best_effort_reindex(&note).await);

    app.close().await;
    Ok(())
}

/// Edit a note's title and/or content, then reindex it best-effort.
pub async fn run_update_note(
    config: &Config,
    note_id: &str,
    user_id: &str,
    update: NoteUpdate,
) -> Result<()> {
    let app = App::open_with_provider(config, provider_or_disabled(config)).await?;

    let (note, outcome) = app
        .notes
        .update_note(note_id, user_id, update)
        .await
        .with_context(|| format!("Failed to update note {}", note_id))?;

    println!("note {} updated", note.id);
    print_outcome(&outcome);

    app.close().await;
    Ok(())
}

pub async fn run_delete_note(config: &Config, note_id: &str, user_id: &str) -> Result<()> {
    let app = App::open_with_provider(config, Arc::new(DisabledProvider)).await?;

    app.notes
        .delete_note(note_id, user_id)
        .await
        .with_context(|| format!("Failed to delete note {}", note_id))?;
    println!("note {} deleted", note_id);

    app.close().await;
    Ok(())
}

fn provider_or_disabled(config: &Config) -> Arc<dyn EmbeddingProvider> {
    match embedding::create_provider(&config.embedding) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "embedding provider unavailable, note will not be indexed");
            Arc::new(DisabledProvider)
        }
    }
}

fn print_outcome(outcome: &ReindexOutcome) {
    match outcome {
        ReindexOutcome::Indexed(n) => println!("  indexed: {} chunks", n),
        ReindexOutcome::Skipped => println!("  indexed: skipped (empty content)"),
        ReindexOutcome::Failed(e) => println!("  indexed: failed ({})", e),
    }
}

/// Print how a text would be chunked. No provider or database needed.
pub fn run_chunk(config: &Config, text: &str, title: &str, chunk_size: Option<usize>) -> Result<()> {
    let mut chunking = config.chunking.to_core()?;
    if let Some(size) = chunk_size {
        chunking = chunking.with_target_size(size)?;
    }

    let chunks = chunk_text(text, title, &chunking);
    println!("{} chunks", chunks.len());
    for chunk in &chunks {
        println!(
            "--- [{}/{}] {} chars",
            chunk.chunk_index() + 1,
            chunk.total_chunks(),
            chunk.content().chars().count()
        );
        println!("{}", chunk.content());
    }
    Ok(())
}

pub async fn run_embed_note(
    config: &Config,
    note_id: &str,
    user_id: &str,
    chunk_size: Option<usize>,
) -> Result<()> {
    let app = App::open(config).await?;
    let chunk_size = chunk_size.unwrap_or(config.chunking.chunk_size);

    let embedded = app
        .notes
        .embed_note_for_user(note_id, user_id, chunk_size)
        .await
        .with_context(|| format!("Failed to embed note {}", note_id))?;

    println!("embed note {}", note_id);
    println!("  chunks created: {}", embedded.len());

    app.close().await;
    Ok(())
}

pub async fn run_embed_all(config: &Config, user_id: &str, chunk_size: Option<usize>) -> Result<()> {
    let app = App::open(config).await?;
    let chunk_size = chunk_size.unwrap_or(config.chunking.chunk_size);

    let summary = app.notes.embed_all_notes(user_id, chunk_size).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    app.close().await;
    Ok(())
}

pub async fn run_list_chunks(config: &Config, note_id: &str, user_id: &str) -> Result<()> {
    // Listing reads stored rows only.
    let app = App::open_with_provider(config, Arc::new(DisabledProvider)).await?;

    let chunks = app.notes.note_chunks(note_id, user_id).await?;
    println!("note {}: {} chunks", note_id, chunks.len());
    for chunk in &chunks {
        println!("--- [{}] {}", chunk.chunk_index, chunk.id);
        println!("{}", chunk.content);
    }

    app.close().await;
    Ok(())
}

pub async fn run_search(config: &Config, query: &str, user_id: &str, limit: Option<usize>) -> Result<()> {
    let limit = validate_limit(limit.or(Some(config.search.default_limit)))?;
    let app = App::open(config).await?;

    let results = app.search.search(user_id, query, limit).await?;

    if results.is_empty() {
        println!("No results.");
    }
    for (i, r) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] note {} (chunk {}/{})",
            i + 1,
            r.similarity,
            r.note_id,
            r.chunk_index + 1,
            r.total_chunks
        );
        let snippet: String = r.content.chars().take(240).collect();
        println!("   {}", snippet.replace('\n', " "));
    }

    app.close().await;
    Ok(())
}
