//! Error taxonomy shared by the chunker, embedding client, and services.

/// Errors produced by notechunk core operations.
///
/// | Variant | Raised when |
/// |---------|-------------|
/// | `Validation` | empty text or query, out-of-range sizes, bad chunking config |
/// | `Config` | provider credential or settings missing |
/// | `Provider` | embedding API failed or returned unusable data |
/// | `DimensionMismatch` | a stored or compared vector has the wrong length |
/// | `NotFound` | referenced note does not exist |
/// | `Forbidden` | note belongs to another user |
/// | `Storage` | the note store failed |
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("vector dimension mismatch ({detail}): expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        detail: String,
    },

    #[error("note not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
