//! `select_rows`: the query planner's single entry point (spec.md §4.G).
//!
//! Grounded on the teacher's `recursive.rs`, whose `RecursiveQueryEngine`
//! split a `plan()` step (compute shape/budget) from an `execute()` step
//! (actually walk); `select_rows_schema` mirrors `plan()`'s role here,
//! computing the output schema without running a single filter, search, or
//! UDF.

use std::collections::BTreeMap;

use lilac_core::{DType, Field, Path, PathComponent, RowId, Span, Value};
use lilac_lake::filter::Filter;
use lilac_lake::{LakeError, LakeStore};
use lilac_signals::ModelSignal;
use lilac_vector::VectorIndex;

use crate::combine::{combine_schema_fields, combine_sibling_columns};
use crate::error::QueryError;
use crate::projection::{resolve_projections, Projection};
use crate::semantic::{concept_search, semantic_search, SemanticHit};

const MATCHED_SPANS_COLUMN: &str = "__matched_spans";

/// One search binding: at most one is active per request (spec.md §4.G
/// "searches (keyword/semantic/concept/metadata over a path)" — metadata
/// search is expressed as an ordinary `Filter` rather than a `SearchBinding`
/// variant, since it needs no ranking or annotation column).
pub enum SearchBinding<'a> {
    Keyword { path: Path, query: String },
    Semantic { query_vector: Vec<f32>, k: usize },
    Concept { signal: &'a dyn ModelSignal, k: usize },
}

pub struct SelectRowsRequest<'a> {
    pub projections: Vec<Projection<'a>>,
    pub filters: Vec<Filter>,
    pub search: Option<SearchBinding<'a>>,
    pub sort_by: Option<Path>,
    pub sort_descending: bool,
    pub offset: usize,
    pub limit: Option<usize>,
    pub combine_columns: bool,
}

impl<'a> Default for SelectRowsRequest<'a> {
    fn default() -> Self {
        Self {
            projections: Vec::new(),
            filters: Vec::new(),
            search: None,
            sort_by: None,
            sort_descending: false,
            offset: 0,
            limit: None,
            combine_columns: false,
        }
    }
}

impl<'a> SelectRowsRequest<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct SelectRowsResult {
    pub rows: Vec<(RowId, BTreeMap<String, Value>)>,
    pub schema: Field,
    pub errors: Vec<LakeError>,
}

/// Executes a query: resolves projections (running UDFs as needed), applies
/// filters, applies at most one search binding, sorts, paginates, and
/// optionally nests sibling enrichment columns (spec.md §4.G "Behaviors").
///
/// # Errors
///
/// Returns `QueryError::UnknownPath` for an unresolvable plain projection,
/// or propagates a UDF/search error.
pub fn select_rows(store: &mut LakeStore, index: &mut VectorIndex, request: &SelectRowsRequest) -> Result<SelectRowsResult, QueryError> {
    let (columns, mut errors) = resolve_projections(store, index, &request.projections)?;
    let schema = select_rows_schema(store, request)?;

    let (mut rows, row_errors) = store.iter_rows(&request.filters, None);
    errors.extend(row_errors);

    let mut keyword_spans: BTreeMap<RowId, Vec<Span>> = BTreeMap::new();
    match &request.search {
        Some(SearchBinding::Keyword { path, query }) => {
            let hits = crate::keyword::keyword_search(&rows, path, query);
            let matched: std::collections::HashSet<RowId> = hits.iter().map(|hit| hit.row_id.clone()).collect();
            for hit in hits {
                keyword_spans.insert(hit.row_id, hit.spans);
            }
            rows.retain(|(row_id, _)| matched.contains(row_id));
        }
        Some(SearchBinding::Semantic { query_vector, k }) => {
            let restrict: Vec<RowId> = rows.iter().map(|(row_id, _)| row_id.clone()).collect();
            let hits = semantic_search(index, query_vector, *k, Some(&restrict))?;
            rows = reorder_by_hits(rows, &hits);
        }
        Some(SearchBinding::Concept { signal, k }) => {
            let restrict: Vec<RowId> = rows.iter().map(|(row_id, _)| row_id.clone()).collect();
            let hits = concept_search(index, *signal, *k, Some(&restrict));
            rows = reorder_by_hits(rows, &hits);
        }
        None => {
            if let Some(sort_path) = &request.sort_by {
                sort_rows(&mut rows, sort_path, request.sort_descending);
            }
        }
    }

    if request.offset > 0 {
        rows = rows.into_iter().skip(request.offset).collect();
    }
    if let Some(limit) = request.limit {
        rows.truncate(limit);
    }

    let out_rows = rows
        .into_iter()
        .map(|(row_id, mut values)| {
            if !columns.is_empty() {
                values.retain(|name, _| columns.contains(name));
            }
            if let Some(spans) = keyword_spans.remove(&row_id) {
                values.insert(MATCHED_SPANS_COLUMN.to_string(), Value::Repeated(spans.into_iter().map(Value::Span).collect()));
            }
            let values = if request.combine_columns { combine_sibling_columns(values) } else { values };
            (row_id, values)
        })
        .collect();

    Ok(SelectRowsResult { rows: out_rows, schema, errors })
}

/// Computes the exact schema `select_rows` would produce for `request`,
/// without reading a row or running a UDF (spec.md §4.G "Schema preview").
///
/// # Errors
///
/// Returns `QueryError::UnknownPath` for an unresolvable plain projection.
pub fn select_rows_schema(store: &LakeStore, request: &SelectRowsRequest) -> Result<Field, QueryError> {
    let base = &store.manifest().schema;
    let Some(base_fields) = &base.fields else {
        return Ok(base.clone());
    };

    let mut selected: BTreeMap<String, Field> = BTreeMap::new();
    for projection in &request.projections {
        match projection {
            Projection::Path(path) => {
                let Some(PathComponent::Name(name)) = path.as_slice().first() else {
                    continue;
                };
                let field = base_fields.get(name).ok_or_else(|| QueryError::UnknownPath(path.to_string()))?;
                selected.insert(name.clone(), field.clone());
            }
            Projection::TextUdf { input_path, signal } => {
                insert_udf_preview(&mut selected, input_path, signal.name(), signal.signal_args(), signal.fields());
            }
            Projection::SplitterUdf { input_path, signal } => {
                insert_udf_preview(&mut selected, input_path, signal.name(), signal.signal_args(), signal.fields());
            }
            Projection::EmbeddingUdf { input_path, signal } => {
                insert_udf_preview(&mut selected, input_path, signal.name(), signal.signal_args(), signal.fields());
            }
            Projection::ModelUdf { input_path, signal, .. } => {
                insert_udf_preview(&mut selected, input_path, signal.name(), signal.signal_args(), signal.fields());
            }
        }
    }

    if selected.is_empty() {
        selected = base_fields.clone();
    }
    if matches!(request.search, Some(SearchBinding::Keyword { .. })) {
        selected.insert(MATCHED_SPANS_COLUMN.to_string(), Field::repeated(Field::leaf(DType::Span)));
    }

    let selected = if request.combine_columns { combine_schema_fields(selected) } else { selected };
    Ok(Field::struct_(selected))
}

/// Mirrors `lilac_executor::executor`'s private `default_output_path`
/// naming convention (`{leaf}__{signal_name}`) so the schema preview can
/// name a UDF's output column without running it.
fn insert_udf_preview(selected: &mut BTreeMap<String, Field>, input_path: &Path, signal_name: &str, signal_args: serde_json::Value, output_fields: Field) {
    let leaf = input_path.leaf_name().unwrap_or("value");
    let output_name = format!("{leaf}__{signal_name}");
    let descriptor = lilac_core::SignalDescriptor { signal_name: signal_name.to_string(), signal_args };
    let field = lilac_schema::create_enrichment_schema(output_fields, input_path, descriptor);
    selected.insert(output_name, field);
}

fn reorder_by_hits(rows: Vec<(RowId, BTreeMap<String, Value>)>, hits: &[SemanticHit]) -> Vec<(RowId, BTreeMap<String, Value>)> {
    let mut by_id: BTreeMap<RowId, BTreeMap<String, Value>> = rows.into_iter().collect();
    hits.iter().filter_map(|hit| by_id.remove(&hit.row_id).map(|values| (hit.row_id.clone(), values))).collect()
}

fn sort_rows(rows: &mut [(RowId, BTreeMap<String, Value>)], path: &Path, descending: bool) {
    let Some(PathComponent::Name(name)) = path.as_slice().first() else {
        return;
    };
    rows.sort_by(|a, b| {
        let ordering = compare_values(a.1.get(name), b.1.get(name));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Int(x)), Some(Value::Int(y))) => x.cmp(y),
        (Some(Value::Float(x)), Some(Value::Float(y))) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::{normalize_path, DType, RowId, Value};
    use lilac_lake::SourceDescriptor;
    use lilac_vector::HnswParams;

    fn text_schema() -> Field {
        let mut fields = BTreeMap::new();
        fields.insert("text".to_string(), Field::leaf(DType::String));
        Field::struct_(fields)
    }

    fn seeded_store(dir: &std::path::Path) -> LakeStore {
        let source = SourceDescriptor { name: "test".into(), config: serde_json::json!({}) };
        let mut store = LakeStore::create(dir, text_schema(), source).unwrap();
        for (id, text) in [("r0", "hello world"), ("r1", "goodbye world"), ("r2", "hello again")] {
            let mut row = BTreeMap::new();
            row.insert("text".to_string(), Value::String(text.to_string()));
            store.append(vec![(RowId::from(id), row)], &text_schema()).unwrap();
        }
        store
    }

    #[test]
    fn empty_result_set_is_valid_and_reports_schema() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path());
        let mut index = VectorIndex::new(2, HnswParams::default());

        let mut request = SelectRowsRequest::new();
        request.filters.push(Filter::new(normalize_path("text"), lilac_lake::filter::FilterOp::Eq(Value::String("nope".into()))));
        let result = select_rows(&mut store, &mut index, &request).unwrap();

        assert!(result.rows.is_empty());
        assert!(result.schema.is_struct());
    }

    #[test]
    fn keyword_search_filters_and_annotates_matched_spans() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path());
        let mut index = VectorIndex::new(2, HnswParams::default());

        let mut request = SelectRowsRequest::new();
        request.search = Some(SearchBinding::Keyword { path: normalize_path("text"), query: "hello".to_string() });
        let result = select_rows(&mut store, &mut index, &request).unwrap();

        assert_eq!(result.rows.len(), 2);
        assert!(result.rows.iter().all(|(_, values)| values.contains_key(MATCHED_SPANS_COLUMN)));
    }

    #[test]
    fn row_id_ascending_tie_break_on_plain_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path());
        let mut index = VectorIndex::new(2, HnswParams::default());

        let request = SelectRowsRequest::new();
        let result = select_rows(&mut store, &mut index, &request).unwrap();
        let ids: Vec<String> = result.rows.iter().map(|(id, _)| id.to_string()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn combine_columns_nests_enrichment_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(dir.path());
        store
            .add_column("text__length", vec![(RowId::from("r0"), Value::Int(11)), (RowId::from("r1"), Value::Int(13)), (RowId::from("r2"), Value::Int(11))], Field::leaf(DType::Int32))
            .unwrap();
        let mut index = VectorIndex::new(2, HnswParams::default());

        let mut request = SelectRowsRequest::new();
        request.combine_columns = true;
        let result = select_rows(&mut store, &mut index, &request).unwrap();

        let (_, values) = &result.rows[0];
        assert!(matches!(values.get("text"), Some(Value::Struct(_))));
    }

    #[test]
    fn schema_preview_matches_executed_schema_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        let request = SelectRowsRequest::new();
        let schema = select_rows_schema(&store, &request).unwrap();
        assert!(lilac_schema::contains_path(&schema, &normalize_path("text")));
    }
}
