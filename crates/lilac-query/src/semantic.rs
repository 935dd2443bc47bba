//! Semantic and concept search: scoring and ranking vectors already sitting
//! in a [`VectorIndex`] (spec.md §4.G "A semantic/concept search is a
//! ModelSignal applied to the embedding at the given path: results are
//! scored and sorted descending; when a restrict-set is available from
//! filters, ANN is filtered accordingly").
//!
//! Grounded on the teacher's `vector.rs`, which ran DuckDB
//! `array_cosine_similarity()` SQL over a brute-force scan; here the same
//! "score every candidate, sort descending" shape is served by
//! `VectorIndex::topk` (for a literal query vector) and a `ModelSignal`'s
//! `vector_compute` (for a fitted concept/classifier head), since both are
//! already native to this workspace's vector stack.

use std::collections::{BTreeMap, HashSet};

use lilac_core::{RowId, Value};
use lilac_signals::ModelSignal;
use lilac_vector::{VectorError, VectorIndex, VectorKey};

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
    pub row_id: RowId,
    pub score: f32,
}

fn restrict_to_keys(index: &VectorIndex, restrict_rows: Option<&[RowId]>) -> Option<Vec<VectorKey>> {
    let rows = restrict_rows?;
    let allowed: HashSet<&RowId> = rows.iter().collect();
    Some(index.keys().iter().filter(|key| allowed.contains(&key.row_id)).cloned().collect())
}

/// Nearest-neighbor search against a literal query vector (spec.md §4.G,
/// the embedding-path half of a search binding).
///
/// # Errors
///
/// Propagates `VectorError` on a dimension mismatch between `query_vector`
/// and the index.
pub fn semantic_search(index: &VectorIndex, query_vector: &[f32], k: usize, restrict_rows: Option<&[RowId]>) -> Result<Vec<SemanticHit>, VectorError> {
    let restrict_keys = restrict_to_keys(index, restrict_rows);
    let hits = index.topk(query_vector, k, restrict_keys.as_deref())?;
    Ok(best_per_row_sorted(hits.into_iter().map(|(key, score)| (key.row_id, score)), k))
}

/// Concept/classifier search: every candidate vector scored by `signal`
/// (typically a fitted concept's logistic model wrapped as a `ModelSignal`),
/// sorted descending, truncated to `k`.
#[must_use]
pub fn concept_search(index: &VectorIndex, signal: &dyn ModelSignal, k: usize, restrict_rows: Option<&[RowId]>) -> Vec<SemanticHit> {
    let keys: Vec<VectorKey> = restrict_to_keys(index, restrict_rows).unwrap_or_else(|| index.keys().to_vec());
    let values = signal.vector_compute(&keys, index);
    let scored = keys.into_iter().zip(values).filter_map(|(key, value)| score_of(&value).map(|score| (key.row_id, score)));
    best_per_row_sorted(scored, k)
}

fn score_of(value: &Value) -> Option<f32> {
    match value {
        Value::Float(f) => Some(*f as f32),
        Value::Int(i) => Some(*i as f32),
        _ => None,
    }
}

/// Collapses multiple chunk scores per row down to each row's best score,
/// then sorts descending with row-id-ascending tie-breaks (spec.md §4.G
/// "Determinism: tie-breaks by row-id ascending").
fn best_per_row_sorted(items: impl IntoIterator<Item = (RowId, f32)>, k: usize) -> Vec<SemanticHit> {
    let mut best: BTreeMap<RowId, f32> = BTreeMap::new();
    for (row_id, score) in items {
        best.entry(row_id).and_modify(|existing| { if score > *existing { *existing = score; } }).or_insert(score);
    }
    let mut hits: Vec<SemanticHit> = best.into_iter().map(|(row_id, score)| SemanticHit { row_id, score }).collect();
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.row_id.cmp(&b.row_id)));
    hits.truncate(k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::{DType, Field};
    use lilac_signals::{ExecutionKind, InputType, SignalMeta};
    use lilac_vector::HnswParams;

    fn populated_index() -> VectorIndex {
        let mut index = VectorIndex::new(2, HnswParams::default());
        index
            .add(
                vec![
                    VectorKey::whole_value(RowId::from("near")),
                    VectorKey::whole_value(RowId::from("far")),
                ],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .unwrap();
        index
    }

    #[test]
    fn semantic_search_ranks_closest_vector_first() {
        let index = populated_index();
        let hits = semantic_search(&index, &[1.0, 0.0], 2, None).unwrap();
        assert_eq!(hits[0].row_id, RowId::from("near"));
    }

    #[test]
    fn restrict_rows_excludes_other_candidates() {
        let index = populated_index();
        let restrict = vec![RowId::from("far")];
        let hits = semantic_search(&index, &[1.0, 0.0], 2, Some(&restrict)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].row_id, RowId::from("far"));
    }

    struct StubConcept;
    impl SignalMeta for StubConcept {
        fn name(&self) -> &str {
            "stub_concept"
        }
        fn input_type(&self) -> InputType {
            InputType::TextEmbedding
        }
        fn execution_kind(&self) -> ExecutionKind {
            ExecutionKind::Threads
        }
        fn fields(&self) -> Field {
            Field::leaf(DType::Float32)
        }
    }
    impl ModelSignal for StubConcept {
        fn embedding_name(&self) -> &str {
            "stub_embedding"
        }

        fn vector_compute(&self, keys: &[VectorKey], index: &VectorIndex) -> Vec<Value> {
            let vectors = index.get(keys);
            vectors
                .into_iter()
                .map(|maybe| match maybe {
                    Some(v) => Value::Float(f64::from(v[0])),
                    None => Value::Absent,
                })
                .collect()
        }
    }

    #[test]
    fn concept_search_sorts_by_score_descending() {
        let index = populated_index();
        let hits = concept_search(&index, &StubConcept, 2, None);
        assert_eq!(hits[0].row_id, RowId::from("near"));
        assert!(hits[0].score > hits[1].score);
    }
}
