//! Concept store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConceptError {
    #[error("draft {0:?} not found in concept")]
    UnknownDraft(String),

    #[error("length of embeddings ({embeddings}) must match length of labels ({labels})")]
    LabelLengthMismatch { embeddings: usize, labels: usize },

    #[error("length of sample_weights ({weights}) must match length of labels ({labels})")]
    WeightLengthMismatch { weights: usize, labels: usize },

    #[error("expected embedding width {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A concept save/load against `lilac-db` failed.
    #[error("concept persistence error: {0}")]
    Persistence(String),
}
