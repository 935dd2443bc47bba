//! # lilac-schema
//!
//! Schema algebra and JSON Schema validation over Lilac's `Field` tree
//! (spec.md §4.A).
//!
//! This crate provides:
//! - `merge`: recursive union of two schema trees, failing on dtype conflict
//! - `contains_path` / `leaves`: path membership and leaf enumeration
//! - `create_enrichment_schema`: wraps a signal's output shape in the
//!   repeated-field nesting implied by the path it ran over, and attaches
//!   the producing `SignalDescriptor`
//! - `SchemaRegistry`: JSON Schema generation (via `schemars`) and
//!   validation (via `jsonschema`) for `lilac-core`'s types
//!
//! Consumer crates (`lilac-lake`, `lilac-executor`, `lilac-query`) depend on
//! `lilac-schema` to compute and validate the schema a dataset's manifest
//! grows into as enrichment signals are applied.

pub mod enrichment;
pub mod error;
pub mod merge;
pub mod paths;
pub mod registry;

pub use enrichment::{create_enrichment_schema, create_leaf_enrichment_schema, is_repeated_path};
pub use error::SchemaError;
pub use merge::merge;
pub use paths::{contains_path, leaves};
pub use registry::SchemaRegistry;
