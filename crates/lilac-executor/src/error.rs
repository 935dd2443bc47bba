//! Enrichment executor error types (spec.md §4.E, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Lake(#[from] lilac_lake::LakeError),

    #[error(transparent)]
    Schema(#[from] lilac_schema::SchemaError),

    #[error(transparent)]
    Vector(#[from] lilac_vector::VectorError),

    #[error(transparent)]
    Signal(#[from] lilac_signals::SignalError),

    /// The input path does not resolve against the dataset's current
    /// schema.
    #[error("input path '{0}' not found in schema")]
    UnknownPath(String),

    /// The run was cancelled cooperatively between batches (spec.md §4.E
    /// step 5).
    #[error("enrichment run cancelled")]
    Cancelled,

    /// Resolving a `ModelSignal`'s embedding/splitter dependency chain
    /// revisited a signal already on the current path (spec.md §4.E step 1
    /// "cycles are a configuration error").
    #[error("dependency cycle resolving signal chain: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),
}
