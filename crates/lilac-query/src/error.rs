//! Errors surfaced by the query planner (spec.md §4.G, §7 `ConfigError`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown path: {0}")]
    UnknownPath(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error(transparent)]
    Lake(#[from] lilac_lake::LakeError),
    #[error(transparent)]
    Schema(#[from] lilac_schema::SchemaError),
    #[error(transparent)]
    Executor(#[from] lilac_executor::ExecutorError),
    #[error(transparent)]
    Vector(#[from] lilac_vector::VectorError),
}
