//! Concrete embedding providers.
//!
//! - **[`DisabledProvider`]**: fails every call; used when embeddings are
//!   not configured.
//! - **[`OpenAiProvider`]**: calls `POST {base_url}/embeddings`.
//!
//! Providers make exactly one HTTP request per batch and never retry;
//! failures surface as [`Error::Provider`]. The API key is read once, when
//! the provider is built.
//!
//! ```rust,no_run
//! # use notechunk::config::EmbeddingConfig;
//! # use notechunk::embedding::create_provider;
//! let mut config = EmbeddingConfig::default();
//! config.provider = "disabled".to_string();
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use notechunk_core::embedding::{EmbeddingProvider, IndexedEmbedding};
use notechunk_core::{Error, Result};

use crate::config::EmbeddingConfig;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

// ============ Disabled Provider ============

/// A provider that rejects every request with a configuration error.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn create_embeddings(&self, _texts: &[String]) -> Result<Vec<IndexedEmbedding>> {
        Err(Error::Config(
            "embedding provider is disabled; set [embedding] provider in config".to_string(),
        ))
    }
}

// ============ OpenAI Provider ============

/// Embedding provider backed by the OpenAI embeddings API.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dims: usize,
    base_url: String,
}

impl OpenAiProvider {
    /// Build a provider using the key in `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the variable is unset or blank.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config(format!(
                "{API_KEY_ENV} environment variable not set"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            dims: config.dims,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn create_embeddings(&self, texts: &[String]) -> Result<Vec<IndexedEmbedding>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "OpenAI API error {status}: {body_text}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("invalid OpenAI response body: {e}")))?;
        parse_openai_response(&json)
    }
}

/// Extract `data[].{index, embedding}` from an embeddings response.
///
/// Order is left as returned; callers reassemble by `index`.
pub fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<IndexedEmbedding>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| Error::Provider("invalid OpenAI response: missing data array".to_string()))?;

    if data.is_empty() {
        return Err(Error::Provider(
            "OpenAI response contained no embeddings".to_string(),
        ));
    }

    data.iter()
        .map(|item| {
            let index = item
                .get("index")
                .and_then(|i| i.as_u64())
                .ok_or_else(|| Error::Provider("invalid OpenAI response: missing index".to_string()))?;
            let embedding = item
                .get("embedding")
                .and_then(|e| e.as_array())
                .ok_or_else(|| {
                    Error::Provider("invalid OpenAI response: missing embedding".to_string())
                })?;
            let vector = embedding
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();
            Ok(IndexedEmbedding {
                index: index as usize,
                vector,
            })
        })
        .collect()
}

/// Create the provider named by `config.provider`.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledProvider`] |
/// | `"openai"` | [`OpenAiProvider`] |
pub fn create_provider(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        other => anyhow::bail!("Unknown embedding provider: {}", other),
    }
}
