//! Task manager error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),

    /// A worker panicked or returned an error mid-shard; the task record
    /// carries this as its `error` field (spec.md §4.I "captures the worker
    /// traceback").
    #[error("task '{task}' shard '{shard}' failed: {message}")]
    ShardFailed { task: String, shard: String, message: String },

    /// A manifest save/restore against `lilac-db` failed.
    #[error("task persistence error: {0}")]
    Persistence(String),
}
