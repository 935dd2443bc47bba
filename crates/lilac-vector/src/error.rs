//! Vector index error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("key/embedding length mismatch: {keys} keys vs {rows} embedding rows")]
    LengthMismatch { keys: usize, rows: usize },

    #[error("embedding dimension mismatch: index is {expected}-d, got {actual}-d")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector index has no embeddings loaded; call add() or load() first")]
    Empty,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
