//! Composite keys addressing one embedding chunk (spec.md §4.C).

use lilac_core::RowId;
use serde::{Deserialize, Serialize};

/// Identifies one `{span, vector}` chunk: the row it came from, the indices
/// walked through any repeated fields on the way to the embedding leaf, and
/// which chunk of that leaf's value this is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VectorKey {
    pub row_id: RowId,
    pub path_indices: Vec<usize>,
    pub chunk_index: usize,
}

impl VectorKey {
    #[must_use]
    pub fn new(row_id: RowId, path_indices: Vec<usize>, chunk_index: usize) -> Self {
        Self {
            row_id,
            path_indices,
            chunk_index,
        }
    }

    /// A key for an unchunked (single-span) embedding value.
    #[must_use]
    pub fn whole_value(row_id: RowId) -> Self {
        Self {
            row_id,
            path_indices: Vec::new(),
            chunk_index: 0,
        }
    }
}
