//! Dimensionality reduction, density clustering, and LLM-driven titling
//! (spec.md §4.F): reduce embeddings to a handful of dimensions, cluster
//! them with HDBSCAN, title the resulting groups, then group the titles
//! themselves into named categories.

pub mod cluster;
pub mod error;
pub mod pipeline;
pub mod reduce;
pub mod titler;

pub use cluster::cluster as run_clustering;
pub use error::ClusterError;
pub use pipeline::{assignment_to_value, cluster_output_field, run, ClusterAssignment, ClusterPipelineConfig, NOISE_CLUSTER_ID};
pub use reduce::reduce;
pub use titler::{title_with_retry, Categorizer, RetryConfig, Titler, TitlerError, FAILED_TO_TITLE};
