//! Schema validation and algebra error types.

use thiserror::Error;

/// Errors from schema merge, path resolution, or JSON Schema validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// `merge(a, b)` found two fields at the same path with incompatible dtypes.
    #[error("dtype conflict at {path}: {left} vs {right}")]
    DtypeConflict {
        path: String,
        left: String,
        right: String,
    },

    /// A requested path does not resolve against the schema.
    #[error("path not found in schema: {0}")]
    PathNotFound(String),

    /// Reading an enrichment column whose producing signal is not in the
    /// registry (spec.md §3: "reading the column without the producing
    /// signal class in the registry is a schema-compatibility error").
    #[error(
        "schema-compatibility error: column at {path} was produced by unregistered signal '{signal_name}'"
    )]
    UnregisteredSignal { path: String, signal_name: String },

    /// Requested named schema was not found in the registry.
    #[error("schema not found: {0}")]
    NotFound(String),

    /// A JSON value did not pass schema validation.
    #[error("validation failed: {errors:?}")]
    ValidationFailed {
        /// Individual error messages from the validator.
        errors: Vec<String>,
    },

    /// Schema generation or compilation error.
    #[error("schema generation error: {0}")]
    Generation(String),
}
