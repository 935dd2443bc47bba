//! Signal registry and execution-contract error types.

use thiserror::Error;

/// Errors raised looking up or invoking a registered signal (spec.md §4.D,
/// §7 `ConfigError`/`DependencyError`).
#[derive(Debug, Error)]
pub enum SignalError {
    /// The named signal is not present in the registry.
    #[error("signal not found in registry: {0}")]
    NotFound(String),

    /// A signal with this name is already registered (registration is
    /// process-wide and clearing is test-only, spec.md §4.D).
    #[error("signal already registered: {0}")]
    AlreadyRegistered(String),

    /// A declared dependency (e.g. a `ModelSignal`'s embedding) is not
    /// registered.
    #[error("dependency error: signal '{dependency}' required by '{dependent}' is not registered")]
    MissingDependency { dependent: String, dependency: String },

    /// A remote call (embedding, model, titler) failed after exhausting its
    /// retry budget.
    #[error("transient remote error after {attempts} attempt(s): {message}")]
    TransientRemote { attempts: u32, message: String },
}
