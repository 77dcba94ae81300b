//! Embedding provider trait, the order-preserving [`EmbeddingClient`],
//! and vector utilities.
//!
//! Concrete providers (OpenAI, disabled) live in the `notechunk` app
//! crate. Providers report results as `(index, vector)` pairs; the client
//! never trusts response order and reassembles by index. Every vector
//! must have the provider's advertised length, unless it advertises `0`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// One vector returned by a provider, tagged with the position of the
/// input text it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEmbedding {
    pub index: usize,
    pub vector: Vec<f32>,
}

/// Trait for embedding providers.
///
/// Implementations make one upstream call per `create_embeddings`
/// invocation and do not retry.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`), or `0`
    /// when the length is not known up front.
    fn dims(&self) -> usize;
    /// Embed `texts`, returning one entry per input in any order.
    async fn create_embeddings(&self, texts: &[String]) -> Result<Vec<IndexedEmbedding>>;
}

/// Validating, order-preserving front end over an [`EmbeddingProvider`].
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn dims(&self) -> usize {
        self.provider.dims()
    }

    /// Embed a single text (e.g. a search query).
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for blank text, checked before any provider
    /// call; [`Error::Provider`] if the provider fails or returns nothing.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("text cannot be empty".to_string()));
        }

        let results = self
            .provider
            .create_embeddings(&[trimmed.to_string()])
            .await?;
        reassemble(results, 1, self.dims())?
            .pop()
            .ok_or_else(|| Error::Provider("empty embedding response".to_string()))
    }

    /// Embed many texts in one provider call.
    ///
    /// Blank entries are dropped before the call; the result holds one
    /// vector per retained entry, in input order. Returns an empty vector
    /// without calling the provider when nothing is left.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let retained: Vec<String> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        if retained.is_empty() {
            return Ok(Vec::new());
        }

        let results = self.provider.create_embeddings(&retained).await?;
        reassemble(results, retained.len(), self.dims())
    }
}

/// Scatter index-tagged results into a vector sized to the input.
/// A non-zero `dims` is the required length of every vector.
fn reassemble(
    results: Vec<IndexedEmbedding>,
    expected: usize,
    dims: usize,
) -> Result<Vec<Vec<f32>>> {
    if results.is_empty() {
        return Err(Error::Provider("provider returned no embeddings".to_string()));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in results {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            Error::Provider(format!(
                "embedding index {} out of range for {expected} inputs",
                item.index
            ))
        })?;
        if dims != 0 && item.vector.len() != dims {
            return Err(Error::Provider(format!(
                "embedding for input {} has {} dimensions, model produces {dims}",
                item.index,
                item.vector.len()
            )));
        }
        if slot.replace(item.vector).is_some() {
            return Err(Error::Provider(format!(
                "duplicate embedding for input {}",
                item.index
            )));
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| Error::Provider(format!("missing embedding for input {i}")))
        })
        .collect()
}

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Pack a vector into the `note_chunks.embedding` BLOB layout:
/// consecutive little-endian `f32`s, no header.
///
/// ```rust
/// use notechunk_core::embedding::{blob_to_vector, vector_to_blob};
///
/// let blob = vector_to_blob(&[0.5, -1.0]);
/// assert_eq!(blob.len(), 8);
/// assert_eq!(blob_to_vector(&blob, 2).unwrap(), [0.5, -1.0]);
/// assert!(blob_to_vector(&blob, 3).is_err());
/// ```
pub fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Unpack a BLOB written by [`vector_to_blob`].
///
/// # Errors
///
/// [`Error::DimensionMismatch`] if the blob is not a whole number of
/// `f32`s, or if `dims` is non-zero and the vector has another length.
pub fn blob_to_vector(blob: &[u8], dims: usize) -> Result<Vec<f32>> {
    if blob.len() % F32_BYTES != 0 {
        return Err(Error::DimensionMismatch {
            expected: dims,
            actual: blob.len() / F32_BYTES,
            detail: format!("{} trailing bytes", blob.len() % F32_BYTES),
        });
    }
    let vector: Vec<f32> = blob
        .chunks_exact(F32_BYTES)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    if dims != 0 && vector.len() != dims {
        return Err(Error::DimensionMismatch {
            expected: dims,
            actual: vector.len(),
            detail: "stored vector".to_string(),
        });
    }
    Ok(vector)
}

/// Cosine similarity of a query against a stored vector, accumulated in
/// `f64`. A zero-norm side scores `0.0`.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] when the lengths differ.
pub fn cosine_similarity(query: &[f32], stored: &[f32]) -> Result<f64> {
    if query.len() != stored.len() {
        return Err(Error::DimensionMismatch {
            expected: query.len(),
            actual: stored.len(),
            detail: "similarity operands".to_string(),
        });
    }

    let (dot, norm_q, norm_s) = query.iter().zip(stored).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, nq, ns), (&q, &s)| {
            let (q, s) = (f64::from(q), f64::from(s));
            (dot + q * s, nq + q * q, ns + s * s)
        },
    );

    let denom = norm_q.sqrt() * norm_s.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / denom)
}
