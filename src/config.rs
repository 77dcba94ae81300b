use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use notechunk_core::chunk::{
    ChunkingConfig as CoreChunkingConfig, DEFAULT_OVERLAP, DEFAULT_SEPARATOR, DEFAULT_TARGET_SIZE,
};
use notechunk_core::search::{DEFAULT_LIMIT, MAX_LIMIT};
use notechunk_core::service::{validate_chunk_size, MIN_CHUNK_SIZE};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}
fn default_busy_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            separator: default_separator(),
        }
    }
}

impl ChunkingConfig {
    pub fn to_core(&self) -> Result<CoreChunkingConfig> {
        Ok(CoreChunkingConfig::new(
            self.chunk_size,
            self.overlap,
            self.separator.clone(),
        )?)
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_TARGET_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}
fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dims: default_dims(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    validate_chunk_size(config.chunking.chunk_size)
        .with_context(|| "Invalid [chunking] chunk_size")?;
    config
        .chunking
        .to_core()
        .with_context(|| "Invalid [chunking] section")?;
    // Per-request chunk sizes may go as low as MIN_CHUNK_SIZE.
    if config.chunking.overlap >= MIN_CHUNK_SIZE {
        anyhow::bail!(
            "chunking.overlap ({}) must be smaller than the minimum chunk size {}",
            config.chunking.overlap,
            MIN_CHUNK_SIZE
        );
    }
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be > 0");
    }

    // Validate search
    if !(1..=MAX_LIMIT).contains(&config.search.default_limit) {
        anyhow::bail!("search.default_limit must be in [1, {}]", MAX_LIMIT);
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }
    if config.embedding.is_enabled() && config.embedding.dims == 0 {
        anyhow::bail!(
            "embedding.dims must be > 0 when provider is '{}'",
            config.embedding.provider
        );
    }

    Ok(config)
}
