//! A single columnar shard file: row-id column plus the struct fields of
//! one schema, written and read as Parquet (spec.md §4.B, §6).

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path as FsPath;
use std::sync::Arc;

use arrow_array::builder::{make_builder, ArrayBuilder, StringBuilder};
use arrow_array::{ArrayRef, RecordBatch, StringArray, StructArray};
use arrow_schema::Schema;
use lilac_core::{Field, RowId, Value};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::arrow_bridge::{append_null_recursive, append_value, array_value, field_to_arrow, schema_to_arrow, ROW_ID_COLUMN};
use crate::error::LakeError;

/// One row as it is appended to a shard: its stable id plus its top-level
/// struct field values.
pub type Row = (RowId, BTreeMap<String, Value>);

/// Writes `rows` (conforming to `schema`, a struct `Field`) to a new Parquet
/// file at `path`.
///
/// # Errors
///
/// Returns `LakeError::Arrow`/`LakeError::Parquet`/`LakeError::Io` if schema
/// construction, encoding, or the file write fails.
pub fn write_shard(path: &FsPath, schema: &Field, rows: &[Row]) -> Result<(), LakeError> {
    let arrow_schema = schema_to_arrow(schema)?;
    let batch = rows_to_record_batch(&arrow_schema, schema, rows)?;

    let file = File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, Arc::new(arrow_schema), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn rows_to_record_batch(
    arrow_schema: &Schema,
    schema: &Field,
    rows: &[Row],
) -> Result<RecordBatch, LakeError> {
    let fields = schema.fields.as_ref().expect("dataset schema root must be a struct");

    let mut row_id_builder = StringBuilder::with_capacity(rows.len(), rows.len() * 16);
    let mut column_builders: Vec<Box<dyn ArrayBuilder>> = arrow_schema
        .fields()
        .iter()
        .skip(1)
        .map(|f| make_builder(f.data_type(), rows.len()))
        .collect();

    for (row_id, values) in rows {
        row_id_builder.append_value(row_id.as_str());
        for (name, builder) in fields.keys().zip(column_builders.iter_mut()) {
            let arrow_field = arrow_schema.field_with_name(name)?;
            match values.get(name) {
                Some(value) => {
                    append_value(builder.as_mut(), arrow_field.data_type(), value);
                }
                None => append_null_recursive(builder.as_mut(), arrow_field.data_type()),
            }
        }
    }

    let mut columns: Vec<ArrayRef> = vec![Arc::new(row_id_builder.finish())];
    columns.extend(column_builders.iter_mut().map(|b| b.finish()));

    Ok(RecordBatch::try_new(Arc::new(arrow_schema.clone()), columns)?)
}

/// Reads every row of a shard file back into `(RowId, struct Value)` pairs.
///
/// # Errors
///
/// Returns `LakeError::CorruptShard` if the file cannot be opened or parsed
/// as Parquet matching the expected schema.
pub fn read_shard(path: &FsPath, schema: &Field) -> Result<Vec<Row>, LakeError> {
    let corrupt = |message: String| LakeError::CorruptShard {
        shard_path: path.display().to_string(),
        row_id_start: String::new(),
        row_id_end: String::new(),
        message,
    };

    let file = File::open(path).map_err(|e| corrupt(e.to_string()))?;
    let reader_builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| corrupt(e.to_string()))?;
    let reader = reader_builder.build().map_err(|e| corrupt(e.to_string()))?;

    let fields = schema.fields.as_ref().expect("dataset schema root must be a struct");
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.map_err(|e| corrupt(e.to_string()))?;
        let row_id_col = batch
            .column_by_name(ROW_ID_COLUMN)
            .ok_or_else(|| corrupt("missing row id column".into()))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| corrupt("row id column is not a string array".into()))?;

        // A shard may carry only a subset of the dataset's top-level
        // columns (an `add_column` shard holds just the row-id key plus one
        // new enrichment column) — iterate the batch's own columns, not the
        // full dataset schema, and consult `schema` only for dtype hints.
        let batch_columns: Vec<&str> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .filter(|name| *name != ROW_ID_COLUMN)
            .collect();

        for i in 0..batch.num_rows() {
            let row_id = RowId::from(row_id_col.value(i));
            let mut struct_values = BTreeMap::new();
            for name in &batch_columns {
                let column = batch.column_by_name(name).unwrap();
                let dtype = fields.get(*name).and_then(|f| f.dtype);
                struct_values.insert((*name).to_string(), array_value(column, i, dtype));
            }
            rows.push((row_id, struct_values));
        }
    }

    Ok(rows)
}

/// Builds a single Arrow `StructArray` column for one row-group's worth of
/// struct values — used by `add_column` when writing an enrichment shard
/// that carries only the row-id key plus one new leaf/struct column.
#[must_use]
pub fn struct_array_from_field(name: &str, field: &Field, values: &[Value]) -> ArrayRef {
    let arrow_field = field_to_arrow(name, field);
    let mut builder = make_builder(arrow_field.data_type(), values.len());
    for value in values {
        append_value(builder.as_mut(), arrow_field.data_type(), value);
    }
    let array = builder.finish();
    if matches!(arrow_field.data_type(), arrow_schema::DataType::Struct(_)) {
        array
    } else {
        Arc::new(StructArray::new(
            arrow_schema::Fields::from(vec![arrow_field]),
            vec![array],
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::DType;

    fn sample_schema() -> Field {
        let mut fields = BTreeMap::new();
        fields.insert("text".to_string(), Field::leaf(DType::String));
        fields.insert("score".to_string(), Field::leaf(DType::Int32));
        Field::struct_(fields)
    }

    #[test]
    fn write_then_read_shard_roundtrips_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shard-0.parquet");
        let schema = sample_schema();

        let mut row0 = BTreeMap::new();
        row0.insert("text".to_string(), Value::String("hello".into()));
        row0.insert("score".to_string(), Value::Int(3));

        let mut row1 = BTreeMap::new();
        row1.insert("text".to_string(), Value::String("world".into()));
        row1.insert("score".to_string(), Value::Absent);

        let rows = vec![
            (RowId::from("row-0"), row0),
            (RowId::from("row-1"), row1),
        ];

        write_shard(&path, &schema, &rows).unwrap();
        let read_back = read_shard(&path, &schema).unwrap();

        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[0].0, RowId::from("row-0"));
        assert_eq!(read_back[0].1.get("text"), Some(&Value::String("hello".into())));
        assert_eq!(read_back[1].1.get("score"), Some(&Value::Null));
    }
}
