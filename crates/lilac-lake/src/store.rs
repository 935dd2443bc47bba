//! `LakeStore`: the columnar store over a dataset directory (spec.md §4.B).

use std::collections::BTreeMap;
use std::path::PathBuf;

use lilac_core::{Field, RowId, Value};
use lilac_schema::merge;
use uuid::Uuid;

use crate::error::LakeError;
use crate::filter::Filter;
use crate::manifest::{Manifest, ShardMeta, SourceDescriptor};
use crate::shard;

/// Columnar store for one dataset directory.
///
/// Each shard is an independently-written Parquet file; the manifest lists
/// them and is rewritten atomically (write-new, rename) after every mutation
/// (spec.md §5 "columnar store tolerates concurrent appenders").
pub struct LakeStore {
    dir: PathBuf,
    manifest: Manifest,
}

impl LakeStore {
    /// Open an existing dataset directory.
    ///
    /// # Errors
    ///
    /// Returns `LakeError::ManifestMissing` if no manifest is present.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LakeError> {
        let dir = dir.into();
        let manifest = Manifest::load(&dir)?;
        Ok(Self { dir, manifest })
    }

    /// Create a new dataset directory with an empty shard list.
    ///
    /// # Errors
    ///
    /// Returns `LakeError::Io` if the directory cannot be created.
    pub fn create(
        dir: impl Into<PathBuf>,
        schema: Field,
        source: SourceDescriptor,
    ) -> Result<Self, LakeError> {
        let dir = dir.into();
        let manifest = Manifest::new(schema, source);
        manifest.save(&dir)?;
        Ok(Self { dir, manifest })
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Append a new shard of freshly ingested rows, merging `schema` into
    /// the dataset's running schema.
    ///
    /// # Errors
    ///
    /// Returns `LakeError::Schema` on a dtype conflict with the existing
    /// schema, or an I/O/Arrow error writing the shard file.
    pub fn append(&mut self, rows: Vec<shard::Row>, schema: &Field) -> Result<(), LakeError> {
        let merged_schema = merge(&self.manifest.schema, schema)?;
        self.manifest.schema = merged_schema.clone();
        self.write_committed_shard(&rows, &merged_schema)
    }

    /// Write a new shard containing only the row-id key and one new
    /// enrichment column at `output_field`, merging its schema in under the
    /// dataset's running schema.
    ///
    /// # Errors
    ///
    /// Returns `LakeError::Schema` on dtype conflict, or an I/O/Arrow error.
    pub fn add_column(
        &mut self,
        column_name: &str,
        rows: Vec<(RowId, Value)>,
        output_field: Field,
    ) -> Result<(), LakeError> {
        let mut column_schema_fields = BTreeMap::new();
        column_schema_fields.insert(column_name.to_string(), output_field);
        let column_schema = Field::struct_(column_schema_fields);

        self.manifest.schema = merge(&self.manifest.schema, &column_schema)?;

        let shard_rows: Vec<shard::Row> = rows
            .into_iter()
            .map(|(row_id, value)| {
                let mut fields = BTreeMap::new();
                fields.insert(column_name.to_string(), value);
                (row_id, fields)
            })
            .collect();

        self.write_committed_shard(&shard_rows, &column_schema)
    }

    fn write_committed_shard(&mut self, rows: &[shard::Row], schema: &Field) -> Result<(), LakeError> {
        let filename = format!("shard-{}.parquet", Uuid::new_v4());
        let path = self.dir.join(&filename);

        shard::write_shard(&path, schema, rows)?;

        self.manifest.shards.push(ShardMeta {
            filename,
            row_count: rows.len(),
            committed: true,
        });
        self.manifest.save(&self.dir)?;
        Ok(())
    }

    /// Stream rows across every committed shard, restricted to the union of
    /// each shard's own columns (row-ids merge on demand across shards — a
    /// full row is assembled only when a caller asks for paths that live in
    /// more than one shard's column set).
    ///
    /// A single corrupt shard is skipped (its `CorruptShard` error recorded
    /// in the returned `errors` vec); other shards still stream.
    #[must_use]
    pub fn iter_rows(
        &self,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> (Vec<(RowId, BTreeMap<String, Value>)>, Vec<LakeError>) {
        let mut merged: BTreeMap<RowId, BTreeMap<String, Value>> = BTreeMap::new();
        let mut errors = Vec::new();

        for shard_meta in self.manifest.committed_shards() {
            let path = self.dir.join(&shard_meta.filename);
            match shard::read_shard(&path, &self.manifest.schema) {
                Ok(rows) => {
                    for (row_id, values) in rows {
                        merged.entry(row_id).or_default().extend(values);
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        let mut rows: Vec<(RowId, BTreeMap<String, Value>)> = merged.into_iter().collect();
        rows.retain(|(_, values)| filters.iter().all(|f| row_matches_filter(values, f)));
        // Sort ascending by row-id for a deterministic tiebreaker (spec.md
        // §4.G "tie-breaks by row-id ascending").
        rows.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        (rows, errors)
    }

    /// Random access by row id.
    #[must_use]
    pub fn get(&self, row_ids: &[RowId]) -> Vec<Option<BTreeMap<String, Value>>> {
        let (rows, _errors) = self.iter_rows(&[], None);
        let index: BTreeMap<&RowId, &BTreeMap<String, Value>> =
            rows.iter().map(|(id, values)| (id, values)).collect();
        row_ids.iter().map(|id| index.get(id).map(|v| (*v).clone())).collect()
    }
}

fn row_matches_filter(values: &BTreeMap<String, Value>, filter: &Filter) -> bool {
    let Some(lilac_core::PathComponent::Name(top)) = filter.path.as_slice().first() else {
        return true;
    };
    let Some(value) = values.get(top) else {
        return filter.matches_scalar(&Value::Absent);
    };
    if filter.path.len() == 1 {
        return filter.matches_scalar(value);
    }
    match value {
        Value::Repeated(items) => filter.matches_repeated(items),
        other => filter.matches_scalar(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterOp;
    use lilac_core::{normalize_path, DType};

    fn source() -> SourceDescriptor {
        SourceDescriptor {
            name: "test".into(),
            config: serde_json::json!({}),
        }
    }

    fn text_schema() -> Field {
        let mut fields = BTreeMap::new();
        fields.insert("text".to_string(), Field::leaf(DType::String));
        Field::struct_(fields)
    }

    #[test]
    fn append_then_iter_rows_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LakeStore::create(dir.path(), text_schema(), source()).unwrap();

        let mut row = BTreeMap::new();
        row.insert("text".to_string(), Value::String("hello world".into()));
        store.append(vec![(RowId::from("r0"), row)], &text_schema()).unwrap();

        let (rows, errors) = store.iter_rows(&[], None);
        assert!(errors.is_empty());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.get("text"), Some(&Value::String("hello world".into())));
    }

    #[test]
    fn add_column_merges_sibling_shard_by_row_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LakeStore::create(dir.path(), text_schema(), source()).unwrap();

        let mut row = BTreeMap::new();
        row.insert("text".to_string(), Value::String("hello".into()));
        store.append(vec![(RowId::from("r0"), row)], &text_schema()).unwrap();

        store
            .add_column(
                "text__length",
                vec![(RowId::from("r0"), Value::Int(5))],
                Field::leaf(DType::Int32),
            )
            .unwrap();

        let (rows, _) = store.iter_rows(&[], None);
        assert_eq!(rows[0].1.get("text__length"), Some(&Value::Int(5)));
    }

    #[test]
    fn filters_restrict_iter_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LakeStore::create(dir.path(), text_schema(), source()).unwrap();

        let mut r0 = BTreeMap::new();
        r0.insert("text".to_string(), Value::String("hello".into()));
        let mut r1 = BTreeMap::new();
        r1.insert("text".to_string(), Value::String("world".into()));
        store
            .append(vec![(RowId::from("a"), r0), (RowId::from("b"), r1)], &text_schema())
            .unwrap();

        let filter = Filter::new(
            normalize_path("text"),
            FilterOp::Eq(Value::String("hello".into())),
        );
        let (rows, _) = store.iter_rows(&[filter], None);
        assert_eq!(rows.len(), 1);
    }
}
