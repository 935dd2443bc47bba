//! Cross-cutting error kinds shared by every Lilac crate (spec.md §7).
//!
//! Domain-specific errors (`LakeError`, `VectorError`, `ExecutorError`, ...)
//! live in their own crates and convert into `CoreError` at the boundaries
//! where the distinction between "this crate's problem" and "a core
//! invariant was violated" stops mattering.

use thiserror::Error;

use crate::path::Path;

/// Errors that can be raised by any Lilac crate, matching the error kinds in
/// spec.md §7 exactly.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown signal name, invalid path, or incompatible dtypes on merge.
    /// Surfaced to the caller; never retried.
    #[error("config error at {path}: {message}")]
    Config { path: String, message: String },

    /// A required embedding signal is not registered. Surfaced; not retried.
    #[error("dependency error: signal '{signal_name}' required by '{dependent}' is not registered")]
    Dependency {
        signal_name: String,
        dependent: String,
    },

    /// Rate limit, timeout, or connection reset from an external service.
    /// Retried with backoff; on exhaustion folds into a per-item sentinel
    /// output rather than propagating.
    #[error("transient remote error after {attempts} attempt(s): {message}")]
    TransientRemote { attempts: u32, message: String },

    /// An unreadable shard file. Isolated to the shard; other shards
    /// continue.
    #[error("corrupt shard {shard_path} (rows {row_id_start}..{row_id_end}): {message}")]
    CorruptShard {
        shard_path: String,
        row_id_start: String,
        row_id_end: String,
        message: String,
    },

    /// Cooperative cancellation; terminal status is `error(cancelled)`.
    #[error("operation cancelled")]
    Cancelled,

    /// An invariant violation — a bug, not a user-facing condition.
    #[error("internal error: {0}")]
    Internal(String),

    /// Catch-all for unexpected errors from dependency crates.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    #[must_use]
    pub fn config(path: &Path, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error kind is retried by the caller rather than
    /// surfaced immediately (spec.md §7 propagation policy).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientRemote { .. })
    }
}
