//! Pairs chunker output with embedding vectors.

use crate::embedding::EmbeddingClient;
use crate::error::{Error, Result};
use crate::models::{Chunk, EmbeddedChunk};

/// Embed every chunk in a single batched provider call.
///
/// The vector at position `i` belongs to the chunk at position `i`.
/// Empty input returns immediately without calling the provider.
pub async fn embed_chunks(client: &EmbeddingClient, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let contents: Vec<String> = chunks.iter().map(|c| c.content().to_string()).collect();
    let vectors = client.embed_many(&contents).await?;

    // Chunk content is never blank, so embed_many drops nothing.
    if vectors.len() != chunks.len() {
        return Err(Error::Provider(format!(
            "expected {} embeddings, got {}",
            chunks.len(),
            vectors.len()
        )));
    }

    Ok(chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
        .collect())
}
