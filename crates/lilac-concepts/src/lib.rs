//! Per-(concept, embedding) logistic classifiers with drafts, dataset
//! calibration, and cross-validated metrics (spec.md §4.H).

pub mod concept;
pub mod error;
pub mod metrics;
pub mod model;
pub mod persistence;
pub mod store;

pub use concept::{Concept, Example, ExampleIn, ExampleOrigin, DRAFT_MAIN};
pub use error::ConceptError;
pub use metrics::{compute_metrics, ConceptMetrics, OverallScore};
pub use model::LogisticModel;
pub use store::{ConceptColumnInfo, ConceptModel, DEFAULT_NUM_NEGATIVE_EXAMPLES};
