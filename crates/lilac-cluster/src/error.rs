//! Clustering and titling error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("dimensionality reduction failed: {0}")]
    Reduction(String),

    #[error("density clustering failed: {0}")]
    Clustering(String),

    #[error("expected {expected} coordinates, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}
