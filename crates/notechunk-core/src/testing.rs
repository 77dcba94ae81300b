//! Deterministic test doubles.
//!
//! [`FakeProvider`] embeds text as a 26-dimensional letter-frequency
//! vector, so texts sharing letters score as similar. It records every
//! batch it receives and can be told to permute its response, return
//! nothing, fail on matching input, or advertise a dimensionality it does
//! not produce.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::embedding::{EmbeddingProvider, IndexedEmbedding};
use crate::error::{Error, Result};

pub const FAKE_DIMS: usize = 26;

/// Letter-frequency vector over `a..=z`, case-insensitive.
pub fn letter_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; FAKE_DIMS];
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() {
            v[(c as u8 - b'a') as usize] += 1.0;
        }
    }
    v
}

#[derive(Default)]
pub struct FakeProvider {
    reverse: bool,
    return_nothing: bool,
    fail_on: Option<String>,
    advertised_dims: Option<usize>,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return results in reverse input order (indices stay correct).
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Answer every call with an empty result list.
    pub fn returning_nothing(mut self) -> Self {
        self.return_nothing = true;
        self
    }

    /// Fail any call whose batch contains a text including `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    /// Report `dims` from [`EmbeddingProvider::dims`] while still
    /// returning letter vectors of length [`FAKE_DIMS`].
    pub fn advertising_dims(mut self, dims: usize) -> Self {
        self.advertised_dims = Some(dims);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl EmbeddingProvider for FakeProvider {
    fn model_name(&self) -> &str {
        "fake-letters"
    }

    fn dims(&self) -> usize {
        self.advertised_dims.unwrap_or(FAKE_DIMS)
    }

    async fn create_embeddings(&self, texts: &[String]) -> Result<Vec<IndexedEmbedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(texts.to_vec());

        if let Some(needle) = &self.fail_on {
            if texts.iter().any(|t| t.contains(needle.as_str())) {
                return Err(Error::Provider(format!(
                    "fake provider rejected input containing {needle:?}"
                )));
            }
        }
        if self.return_nothing {
            return Ok(Vec::new());
        }

        let mut out: Vec<IndexedEmbedding> = texts
            .iter()
            .enumerate()
            .map(|(index, t)| IndexedEmbedding {
                index,
                vector: letter_vector(t),
            })
            .collect();
        if self.reverse {
            out.reverse();
        }
        Ok(out)
    }
}
