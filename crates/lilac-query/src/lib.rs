//! # lilac-query
//!
//! The query planner (spec.md §4.G): `select_rows` resolves a projection
//! list (plain paths and UDF columns) against a dataset's merged schema,
//! applies filters and at most one search binding (keyword, semantic, or
//! concept), sorts, paginates, and optionally nests sibling enrichment
//! columns back into their source path's shape. `select_rows_schema`
//! computes the exact output schema without executing any of that.

pub mod combine;
pub mod error;
pub mod keyword;
pub mod planner;
pub mod projection;
pub mod semantic;

pub use combine::{combine_schema_fields, combine_sibling_columns};
pub use error::QueryError;
pub use keyword::{keyword_search, KeywordHit};
pub use planner::{select_rows, select_rows_schema, SearchBinding, SelectRowsRequest, SelectRowsResult};
pub use projection::{resolve_projections, Projection};
pub use semantic::{concept_search, semantic_search, SemanticHit};
