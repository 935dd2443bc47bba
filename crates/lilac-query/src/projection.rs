//! Projection resolution: validates requested paths against the dataset's
//! merged schema and runs any UDF column on the fly, joined back into the
//! row stream by row-id (spec.md §4.G "Projection").
//!
//! Grounded on `lilac-executor::executor`'s `run_*` functions, which already
//! do the "batch, compute, write as a new column keyed by row-id" work a UDF
//! projection needs; this module's job is only to decide which signal to
//! run and to report back the top-level column name the run produced.

use lilac_core::{Path, PathComponent};
use lilac_executor::{run_embedding_signal, run_model_signal, run_splitter_signal, run_text_signal, EnrichmentRequest};
use lilac_lake::{LakeError, LakeStore};
use lilac_signals::{EmbeddingSignal, ModelSignal, SignalRegistry, SplitterSignal, TextSignal};
use lilac_vector::VectorIndex;

use crate::error::QueryError;

/// One requested output column: a plain path already materialized in the
/// schema, or a UDF binding a signal to an input path (spec.md §4.G
/// "projection list ... plus UDF columns binding a signal to an input
/// path").
pub enum Projection<'a> {
    Path(Path),
    TextUdf { input_path: Path, signal: &'a dyn TextSignal },
    SplitterUdf { input_path: Path, signal: &'a dyn SplitterSignal },
    EmbeddingUdf { input_path: Path, signal: &'a dyn EmbeddingSignal },
    ModelUdf { input_path: Path, signal: &'a dyn ModelSignal, registry: &'a SignalRegistry },
}

/// Resolves every projection against `store`'s schema, executing any UDF
/// column that isn't already materialized under an idempotent signal_args
/// match, and returns the set of top-level column names the result stream
/// must carry plus any per-shard read errors the underlying runs
/// surfaced (spec.md §4.B "Failure" — a corrupt shard is isolated, not
/// fatal to the whole projection).
///
/// # Errors
///
/// Returns `QueryError::UnknownPath` for a plain path absent from the
/// schema, or propagates an executor error from a UDF run.
pub fn resolve_projections(
    store: &mut LakeStore,
    index: &mut VectorIndex,
    projections: &[Projection],
) -> Result<(Vec<String>, Vec<LakeError>), QueryError> {
    let mut columns = Vec::new();
    let mut errors = Vec::new();
    for projection in projections {
        match projection {
            Projection::Path(path) => {
                if !lilac_schema::contains_path(&store.manifest().schema, path) {
                    return Err(QueryError::UnknownPath(path.to_string()));
                }
                push_root(&mut columns, path);
            }
            Projection::TextUdf { input_path, signal } => {
                let request = EnrichmentRequest::new(input_path.clone());
                let outcome = run_text_signal(store, *signal, &request)?;
                push_root(&mut columns, &outcome.output_path);
                errors.extend(outcome.errors);
            }
            Projection::SplitterUdf { input_path, signal } => {
                let request = EnrichmentRequest::new(input_path.clone());
                let outcome = run_splitter_signal(store, *signal, &request)?;
                push_root(&mut columns, &outcome.output_path);
                errors.extend(outcome.errors);
            }
            Projection::EmbeddingUdf { input_path, signal } => {
                let request = EnrichmentRequest::new(input_path.clone());
                let outcome = run_embedding_signal(store, index, *signal, &request)?;
                push_root(&mut columns, &outcome.output_path);
                errors.extend(outcome.errors);
            }
            Projection::ModelUdf { input_path, signal, registry } => {
                let request = EnrichmentRequest::new(input_path.clone());
                let outcome = run_model_signal(store, index, registry, *signal, &request)?;
                push_root(&mut columns, &outcome.output_path);
                errors.extend(outcome.errors);
            }
        }
    }
    Ok((columns, errors))
}

fn push_root(columns: &mut Vec<String>, path: &Path) {
    if let Some(PathComponent::Name(name)) = path.as_slice().first() {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::{normalize_path, DType, Field, RowId, Value};
    use lilac_lake::SourceDescriptor;
    use lilac_signals::TextStatisticsSignal;
    use lilac_vector::HnswParams;
    use std::collections::BTreeMap;

    fn text_schema() -> Field {
        let mut fields = BTreeMap::new();
        fields.insert("text".to_string(), Field::leaf(DType::String));
        Field::struct_(fields)
    }

    #[test]
    fn unknown_plain_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceDescriptor { name: "test".into(), config: serde_json::json!({}) };
        let mut store = LakeStore::create(dir.path(), text_schema(), source).unwrap();
        let mut index = VectorIndex::new(2, HnswParams::default());

        let projections = vec![Projection::Path(normalize_path("missing"))];
        let err = resolve_projections(&mut store, &mut index, &projections).unwrap_err();
        assert!(matches!(err, QueryError::UnknownPath(_)));
    }

    #[test]
    fn text_udf_runs_and_reports_its_output_column() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceDescriptor { name: "test".into(), config: serde_json::json!({}) };
        let mut store = LakeStore::create(dir.path(), text_schema(), source).unwrap();
        let mut row = BTreeMap::new();
        row.insert("text".to_string(), Value::String("hello world".into()));
        store.append(vec![(RowId::from("r0"), row)], &text_schema()).unwrap();
        let mut index = VectorIndex::new(2, HnswParams::default());

        let signal = TextStatisticsSignal;
        let projections = vec![Projection::TextUdf { input_path: normalize_path("text"), signal: &signal }];
        let (columns, errors) = resolve_projections(&mut store, &mut index, &projections).unwrap();
        assert_eq!(columns, vec!["text__text_statistics".to_string()]);
        assert!(errors.is_empty());
    }
}
