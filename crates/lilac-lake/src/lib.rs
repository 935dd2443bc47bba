//! # lilac-lake
//!
//! The columnar store (spec.md §4.B): datasets are sets of self-describing
//! Parquet shards, addressed by stable row id. Exposes `append`,
//! `add_column`, `iter_rows`, `get`, and `manifest()`.
//!
//! Shard reads are isolated: a corrupt shard is reported with its path and
//! row-id range without preventing the rest of the dataset from being read
//! (spec.md §4.B "Failure").

pub mod arrow_bridge;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod shard;
pub mod store;

pub use error::LakeError;
pub use filter::{Filter, FilterOp, RepeatedModifier};
pub use manifest::{ImageInfo, Manifest, ShardMeta, SourceDescriptor};
pub use store::LakeStore;
