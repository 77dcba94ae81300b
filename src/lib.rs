//! # notechunk
//!
//! Chunking, embedding, and semantic search for a notes backend.
//!
//! The algorithms live in [`notechunk_core`]; this crate supplies the
//! runtime pieces around them: TOML configuration, the OpenAI embedding
//! provider, a SQLite note store, and the `notechunk` CLI.
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Note    │──▶│ chunk + embed │──▶│ SQLite store │
//! │  write   │   │ (core)        │   │ note_chunks  │
//! └──────────┘   └──────────────┘   └──────┬───────┘
//!                                          │
//!                      query ─▶ embed ─▶ similarity_search
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | OpenAI and disabled providers |
//! | [`sqlite_store`] | SQLite [`NoteStore`](notechunk_core::store::NoteStore) |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`commands`] | CLI subcommand runners |

pub mod commands;
pub mod config;
pub mod db;
pub mod embedding;
pub mod migrate;
pub mod sqlite_store;
