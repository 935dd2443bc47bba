//! `VectorIndex`: HNSW-backed keyed dense-vector store (spec.md §4.C).
//!
//! Grounded on the reference implementation's `hnswlib`-backed vector store
//! (`vector_store_hnsw.py`): a positional lookup from key to row index,
//! vectors always cast to float32 before insertion, and `ef`/`M`/
//! `ef_construction` as the tunable knobs. `hnsw_rs` is this crate's Rust
//! equivalent of `hnswlib` — no teacher repo in the example pack used an
//! ANN crate, so this dependency is a deliberate "enrich from the real
//! ecosystem" addition (see DESIGN.md).

use std::collections::HashMap;
use std::path::Path;

use hnsw_rs::prelude::*;
use lilac_core::EmbeddingChunk;
use serde::{Deserialize, Serialize};

use crate::error::VectorError;
use crate::key::VectorKey;

/// HNSW construction/search tuning (spec.md §4.C "Implementation contract").
#[derive(Debug, Clone, Copy)]
pub struct HnswParams {
    pub ef_construction: usize,
    pub ef_search: usize,
    pub max_nb_connection: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            ef_construction: 200,
            ef_search: 64,
            max_nb_connection: 16,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    dim: usize,
    keys: Vec<VectorKey>,
    vectors: Vec<Vec<f32>>,
}

/// A keyed dense-vector index for one embedding name.
///
/// Vectors are stored in float32 regardless of producer precision — a
/// caller passing float16-sourced data is expected to have already widened
/// it (spec.md §4.C "Vectors are stored in float32 ... promoted at insert
/// time").
pub struct VectorIndex {
    dim: usize,
    params: HnswParams,
    keys: Vec<VectorKey>,
    key_lookup: HashMap<VectorKey, usize>,
    vectors: Vec<Vec<f32>>,
    hnsw: Option<Hnsw<'static, f32, DistDot>>,
}

impl VectorIndex {
    #[must_use]
    pub fn new(dim: usize, params: HnswParams) -> Self {
        Self {
            dim,
            params,
            keys: Vec::new(),
            key_lookup: HashMap::new(),
            vectors: Vec::new(),
            hnsw: None,
        }
    }

    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn keys(&self) -> &[VectorKey] {
        &self.keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// One-shot bulk insert. Upsert is not required in v1 (spec.md §4.C) —
    /// re-embedding goes through [`Self::rebuild`] instead.
    ///
    /// # Errors
    ///
    /// Returns `VectorError::LengthMismatch` if `keys.len() != matrix.len()`,
    /// or `VectorError::DimensionMismatch` if any row's width differs from
    /// the index's declared dimension.
    pub fn add(&mut self, keys: Vec<VectorKey>, matrix: Vec<Vec<f32>>) -> Result<(), VectorError> {
        if keys.len() != matrix.len() {
            return Err(VectorError::LengthMismatch {
                keys: keys.len(),
                rows: matrix.len(),
            });
        }
        for row in &matrix {
            if row.len() != self.dim {
                return Err(VectorError::DimensionMismatch {
                    expected: self.dim,
                    actual: row.len(),
                });
            }
        }

        let nb_elem = keys.len().max(1);
        let mut hnsw = Hnsw::<f32, DistDot>::new(
            self.params.max_nb_connection,
            nb_elem,
            16,
            self.params.ef_construction,
            DistDot {},
        );

        let start = self.keys.len();
        for (offset, (key, vector)) in keys.into_iter().zip(matrix.into_iter()).enumerate() {
            let row_index = start + offset;
            hnsw.insert((&vector, row_index));
            self.key_lookup.insert(key.clone(), row_index);
            self.keys.push(key);
            self.vectors.push(vector);
        }
        self.hnsw = Some(hnsw);
        Ok(())
    }

    /// Returns vectors in key order; `None` for a key not present in the
    /// index.
    #[must_use]
    pub fn get(&self, keys: &[VectorKey]) -> Vec<Option<Vec<f32>>> {
        keys.iter()
            .map(|k| self.key_lookup.get(k).map(|&i| self.vectors[i].clone()))
            .collect()
    }

    /// Inner-product nearest neighbors. When `restrict_keys` is given,
    /// search is constrained to that subset — done by brute-force scoring
    /// over the (typically much smaller) restricted set rather than asking
    /// the HNSW graph to honor an arbitrary filter, since `hnsw_rs`'s public
    /// search API has no filtered-candidate hook.
    ///
    /// # Errors
    ///
    /// Returns `VectorError::Empty` if the index has no vectors, or
    /// `VectorError::DimensionMismatch` if `query`'s width doesn't match.
    pub fn topk(
        &self,
        query: &[f32],
        k: usize,
        restrict_keys: Option<&[VectorKey]>,
    ) -> Result<Vec<(VectorKey, f32)>, VectorError> {
        if self.is_empty() {
            return Err(VectorError::Empty);
        }
        if query.len() != self.dim {
            return Err(VectorError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        if let Some(restrict) = restrict_keys {
            return Ok(self.brute_force_topk(query, k, restrict));
        }

        let hnsw = self.hnsw.as_ref().ok_or(VectorError::Empty)?;
        let neighbours = hnsw.search(query, k, self.params.ef_search);
        Ok(neighbours
            .into_iter()
            .map(|n| (self.keys[n.d_id].clone(), 1.0 - n.distance))
            .collect())
    }

    fn brute_force_topk(&self, query: &[f32], k: usize, restrict: &[VectorKey]) -> Vec<(VectorKey, f32)> {
        let mut scored: Vec<(VectorKey, f32)> = restrict
            .iter()
            .filter_map(|key| {
                self.key_lookup
                    .get(key)
                    .map(|&i| (key.clone(), dot(query, &self.vectors[i])))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Atomic on-disk snapshot: writes keys + vectors to a temp file, then
    /// renames over `path` (spec.md §4.C `save`).
    ///
    /// # Errors
    ///
    /// Returns `VectorError::Io`/`VectorError::Serde` on write failure.
    pub fn save(&self, path: &Path) -> Result<(), VectorError> {
        let persisted = PersistedIndex {
            dim: self.dim,
            keys: self.keys.clone(),
            vectors: self.vectors.clone(),
        };
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, serde_json::to_vec(&persisted)?)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Loads a snapshot written by [`Self::save`], rebuilding the HNSW graph
    /// from the persisted vectors (the graph topology itself is not
    /// serialized — only the data it was built from — which keeps the
    /// on-disk format simple and portable across `hnsw_rs` versions).
    ///
    /// # Errors
    ///
    /// Returns `VectorError::Io`/`VectorError::Serde` on read failure.
    pub fn load(path: &Path, params: HnswParams) -> Result<Self, VectorError> {
        let bytes = std::fs::read(path)?;
        let persisted: PersistedIndex = serde_json::from_slice(&bytes)?;
        let mut index = Self::new(persisted.dim, params);
        index.add(persisted.keys, persisted.vectors)?;
        Ok(index)
    }

    /// Blue-green rebuild: builds a brand new index from `keys`/`matrix`
    /// rather than mutating this one in place, so a caller can atomically
    /// swap the manifest pointer only once the new index is fully built
    /// (spec.md §9 "Open question — upsert into the ANN index").
    ///
    /// # Errors
    ///
    /// Returns `VectorError::LengthMismatch`/`DimensionMismatch` as `add`.
    pub fn rebuild(dim: usize, params: HnswParams, keys: Vec<VectorKey>, matrix: Vec<Vec<f32>>) -> Result<Self, VectorError> {
        let mut index = Self::new(dim, params);
        index.add(keys, matrix)?;
        Ok(index)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Promotes a float16-sourced embedding chunk list to the float32 vectors
/// the index requires (spec.md §4.C, §9 "Memory discipline for vectors").
/// Chunks with non-f32 producer precision arrive already as `f32` in
/// `EmbeddingChunk` — this helper exists for symmetry with the spec's
/// explicit promotion language and to give the enrichment executor one
/// documented seam to call when wiring an `EmbeddingSignal`'s output into
/// the index.
#[must_use]
pub fn chunks_to_matrix(chunks: &[EmbeddingChunk]) -> Vec<Vec<f32>> {
    chunks.iter().map(|c| c.vector.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::RowId;

    fn key(id: &str) -> VectorKey {
        VectorKey::whole_value(RowId::from(id))
    }

    #[test]
    fn add_then_get_round_trips_vectors() {
        let mut index = VectorIndex::new(3, HnswParams::default());
        index
            .add(
                vec![key("a"), key("b")],
                vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
            )
            .unwrap();

        let got = index.get(&[key("a"), key("missing")]);
        assert_eq!(got[0], Some(vec![1.0, 0.0, 0.0]));
        assert_eq!(got[1], None);
    }

    #[test]
    fn topk_returns_nearest_by_inner_product() {
        let mut index = VectorIndex::new(3, HnswParams::default());
        index
            .add(
                vec![key("a"), key("b"), key("c")],
                vec![
                    vec![1.0, 0.0, 0.0],
                    vec![0.0, 1.0, 0.0],
                    vec![0.9, 0.1, 0.0],
                ],
            )
            .unwrap();

        let results = index.topk(&[1.0, 0.0, 0.0], 2, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, key("a"));
    }

    #[test]
    fn restrict_keys_limits_search_to_subset() {
        let mut index = VectorIndex::new(3, HnswParams::default());
        index
            .add(
                vec![key("a"), key("b"), key("c")],
                vec![
                    vec![1.0, 0.0, 0.0],
                    vec![0.0, 1.0, 0.0],
                    vec![0.9, 0.1, 0.0],
                ],
            )
            .unwrap();

        let restricted = [key("b")];
        let results = index.topk(&[1.0, 0.0, 0.0], 2, Some(&restricted)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, key("b"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emb.idx");
        let mut index = VectorIndex::new(2, HnswParams::default());
        index.add(vec![key("a")], vec![vec![1.0, 2.0]]).unwrap();
        index.save(&path).unwrap();

        let loaded = VectorIndex::load(&path, HnswParams::default()).unwrap();
        assert_eq!(loaded.get(&[key("a")])[0], Some(vec![1.0, 2.0]));
    }
}
