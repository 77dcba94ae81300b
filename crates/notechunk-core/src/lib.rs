//! # notechunk core
//!
//! Runtime-agnostic logic for notechunk: the text chunker, the embedding
//! client and pipeline, the note store abstraction, and the note
//! embedding and search services built on top of them.
//!
//! This crate performs no network or database I/O of its own. Concrete
//! embedding providers and the SQLite store live in the `notechunk`
//! app crate.
//!
//! ## Data flow
//!
//! ```text
//! note text ─▶ chunk_text ─▶ EmbeddingClient::embed_many ─▶ NoteStore::replace_chunks
//! query     ─▶ EmbeddingClient::embed_one ─▶ NoteStore::similarity_search ─▶ SearchMatch
//! ```

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod service;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Error, Result};
