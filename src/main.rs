//! # notechunk CLI
//!
//! ```bash
//! notechunk --config ./config/notechunk.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `notechunk init` | Create the SQLite database and schema |
//! | `notechunk add-note` | Store a note and index it best-effort |
//! | `notechunk update-note <id>` | Edit a note and reindex it best-effort |
//! | `notechunk delete-note <id>` | Delete a note and its chunks |
//! | `notechunk chunk` | Preview how text would be chunked |
//! | `notechunk embed note <id>` | Re-embed one note |
//! | `notechunk embed all` | Re-embed every note of a user |
//! | `notechunk chunks <id>` | List a note's stored chunks |
//! | `notechunk search "<query>"` | Semantic search over a user's notes |
//!
//! Set `RUST_LOG` (default `info`) to control log output.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use notechunk::commands;
use notechunk::config;
use notechunk_core::models::NoteUpdate;

/// notechunk: chunk, embed, and search notes.
#[derive(Parser)]
#[command(
    name = "notechunk",
    about = "notechunk: chunking, embedding, and semantic search for notes",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/notechunk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Store a new note, then index it. Indexing failures are logged and
    /// do not fail the write.
    AddNote {
        /// Owner of the note.
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "")]
        title: String,
        /// Note body. Mutually exclusive with `--file`.
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Read the note body from a file.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Edit a note's title and/or content, then reindex it.
    UpdateNote {
        note_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        title: Option<String>,
        /// New body. Mutually exclusive with `--file`.
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Read the new body from a file.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a note together with its stored chunks.
    DeleteNote {
        note_id: String,
        #[arg(long)]
        user: String,
    },

    /// Print the chunks a text would produce.
    Chunk {
        /// Text to chunk. Read from `--file` when omitted.
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "")]
        title: String,
        /// Override the configured chunk size.
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Embedding management commands.
    Embed {
        #[command(subcommand)]
        action: EmbedAction,
    },

    /// List the stored chunks of a note.
    Chunks {
        note_id: String,
        #[arg(long)]
        user: String,
    },

    /// Semantic search over a user's notes.
    Search {
        query: String,
        #[arg(long)]
        user: String,
        /// Maximum results (1–100).
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
enum EmbedAction {
    /// Re-embed a single note (chunk size 500–3000).
    Note {
        note_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Re-embed every note of a user; per-note failures are reported.
    All {
        #[arg(long)]
        user: String,
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

fn read_body(inline: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, None) => anyhow::bail!("Provide the text inline or with --file"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => commands::run_init(&cfg).await?,
        Commands::AddNote {
            user,
            title,
            content,
            file,
        } => {
            let body = read_body(content, file)?;
            commands::run_add_note(&cfg, &user, &title, &body).await?;
        }
        Commands::UpdateNote {
            note_id,
            user,
            title,
            content,
            file,
        } => {
            let content = match (content, file) {
                (None, None) => None,
                (content, file) => Some(read_body(content, file)?),
            };
            let update = NoteUpdate { title, content };
            commands::run_update_note(&cfg, &note_id, &user, update).await?;
        }
        Commands::DeleteNote { note_id, user } => {
            commands::run_delete_note(&cfg, &note_id, &user).await?
        }
        Commands::Chunk {
            text,
            file,
            title,
            chunk_size,
        } => {
            let body = read_body(text, file)?;
            commands::run_chunk(&cfg, &body, &title, chunk_size)?;
        }
        Commands::Embed { action } => match action {
            EmbedAction::Note {
                note_id,
                user,
                chunk_size,
            } => commands::run_embed_note(&cfg, &note_id, &user, chunk_size).await?,
            EmbedAction::All { user, chunk_size } => {
                commands::run_embed_all(&cfg, &user, chunk_size).await?
            }
        },
        Commands::Chunks { note_id, user } => {
            commands::run_list_chunks(&cfg, &note_id, &user).await?
        }
        Commands::Search { query, user, limit } => {
            commands::run_search(&cfg, &query, &user, limit).await?
        }
    }

    Ok(())
}
