//! Bridges Lilac's dynamic `Field`/`Value` tree to Arrow `Schema`/`RecordBatch`
//! (spec.md §6: "Shard files follow the Parquet-compatible wire format").
//!
//! int8/int16 and float16 leaves are promoted to int32/float32 in storage,
//! mirroring the embedding float16→float32 promotion the vector index
//! already performs at insert time (spec.md §4.C) — Arrow's half-float
//! support is awkward to round-trip through Parquet, and the core never
//! needs narrower-than-32-bit arithmetic on a read-back value.

use std::sync::Arc;

use arrow_array::builder::{
    ArrayBuilder, BinaryBuilder, BooleanBuilder, Date32Builder, Float32Builder, Float64Builder,
    Int32Builder, Int64Builder, ListBuilder, StringBuilder, StructBuilder,
    TimestampMicrosecondBuilder,
};
use arrow_array::{Array, ArrayRef, BooleanArray, StructArray};
use arrow_schema::{DataType, Field as ArrowField, Fields, Schema};
use lilac_core::{DType, EmbeddingChunk, Field, Span, Value};

use crate::error::LakeError;

/// The row-id column every shard carries (spec.md §6).
pub const ROW_ID_COLUMN: &str = "__row_id__";

fn span_arrow_fields() -> Fields {
    Fields::from(vec![
        ArrowField::new("start", DataType::Int32, false),
        ArrowField::new("end", DataType::Int32, false),
    ])
}

fn embedding_chunk_arrow_fields() -> Fields {
    Fields::from(vec![
        ArrowField::new("span", DataType::Struct(span_arrow_fields()), false),
        ArrowField::new(
            "vector",
            DataType::List(Arc::new(ArrowField::new("item", DataType::Float32, false))),
            false,
        ),
    ])
}

/// Maps a single [`DType`] to its Arrow storage type.
#[must_use]
pub fn dtype_to_arrow(dtype: DType) -> DataType {
    match dtype {
        DType::Bool => DataType::Boolean,
        DType::Int8 | DType::Int16 | DType::Int32 => DataType::Int32,
        DType::Int64 => DataType::Int64,
        DType::Float16 | DType::Float32 => DataType::Float32,
        DType::Float64 => DataType::Float64,
        DType::String => DataType::Utf8,
        DType::Bytes => DataType::Binary,
        DType::Timestamp => DataType::Timestamp(arrow_schema::TimeUnit::Microsecond, Some("UTC".into())),
        DType::Date => DataType::Date32,
        DType::Interval => DataType::Int64,
        DType::Span => DataType::Struct(span_arrow_fields()),
        DType::Embedding => DataType::List(Arc::new(ArrowField::new(
            "item",
            DataType::Struct(embedding_chunk_arrow_fields()),
            false,
        ))),
    }
}

/// Converts one `Field` node into its Arrow field representation, recursing
/// into struct/repeated nesting.
#[must_use]
pub fn field_to_arrow(name: &str, field: &Field) -> ArrowField {
    if let Some(dtype) = field.dtype {
        return ArrowField::new(name, dtype_to_arrow(dtype), true);
    }
    if let Some(fields) = &field.fields {
        let children: Vec<ArrowField> = fields
            .iter()
            .map(|(child_name, child)| field_to_arrow(child_name, child))
            .collect();
        return ArrowField::new(name, DataType::Struct(Fields::from(children)), true);
    }
    if let Some(inner) = &field.repeated_field {
        let inner_arrow = field_to_arrow("item", inner);
        return ArrowField::new(name, DataType::List(Arc::new(inner_arrow)), true);
    }
    ArrowField::new(name, DataType::Null, true)
}

/// Builds the full Arrow schema for a shard: the row-id column followed by
/// every top-level field of `schema` (which must itself be a struct).
///
/// # Errors
///
/// Returns `LakeError::UnknownPath` if `schema` is not a struct field.
pub fn schema_to_arrow(schema: &Field) -> Result<Schema, LakeError> {
    let Some(fields) = &schema.fields else {
        return Err(LakeError::UnknownPath(
            "dataset schema root must be a struct".into(),
        ));
    };
    let mut arrow_fields = vec![ArrowField::new(ROW_ID_COLUMN, DataType::Utf8, false)];
    arrow_fields.extend(fields.iter().map(|(name, field)| field_to_arrow(name, field)));
    Ok(Schema::new(arrow_fields))
}

pub(crate) fn append_null_recursive(builder: &mut dyn ArrayBuilder, data_type: &DataType) {
    match data_type {
        DataType::Boolean => builder
            .as_any_mut()
            .downcast_mut::<BooleanBuilder>()
            .unwrap()
            .append_null(),
        DataType::Int32 => builder
            .as_any_mut()
            .downcast_mut::<Int32Builder>()
            .unwrap()
            .append_null(),
        DataType::Int64 => builder
            .as_any_mut()
            .downcast_mut::<Int64Builder>()
            .unwrap()
            .append_null(),
        DataType::Float32 => builder
            .as_any_mut()
            .downcast_mut::<Float32Builder>()
            .unwrap()
            .append_null(),
        DataType::Float64 => builder
            .as_any_mut()
            .downcast_mut::<Float64Builder>()
            .unwrap()
            .append_null(),
        DataType::Utf8 => builder
            .as_any_mut()
            .downcast_mut::<StringBuilder>()
            .unwrap()
            .append_null(),
        DataType::Binary => builder
            .as_any_mut()
            .downcast_mut::<BinaryBuilder>()
            .unwrap()
            .append_null(),
        DataType::Date32 => builder
            .as_any_mut()
            .downcast_mut::<Date32Builder>()
            .unwrap()
            .append_null(),
        DataType::Timestamp(_, _) => builder
            .as_any_mut()
            .downcast_mut::<TimestampMicrosecondBuilder>()
            .unwrap()
            .append_null(),
        DataType::Struct(_) => builder
            .as_any_mut()
            .downcast_mut::<StructBuilder>()
            .unwrap()
            .append_null(),
        DataType::List(_) => builder
            .as_any_mut()
            .downcast_mut::<ListBuilder<Box<dyn ArrayBuilder>>>()
            .unwrap()
            .append_null(),
        other => panic!("unsupported arrow data type in shard encoding: {other:?}"),
    }
}

/// Appends one `Value` to `builder`, whose shape must match `data_type`.
/// `Value::Absent`/`Value::Null` both append a null cell — the absent-value
/// convention is a Lilac-level distinction, not an Arrow-level one; shards
/// alone cannot distinguish "never set" from "explicitly null".
pub(crate) fn append_value(builder: &mut dyn ArrayBuilder, data_type: &DataType, value: &Value) {
    if matches!(value, Value::Absent | Value::Null) {
        append_null_recursive(builder, data_type);
        return;
    }
    match (data_type, value) {
        (DataType::Boolean, Value::Bool(b)) => builder
            .as_any_mut()
            .downcast_mut::<BooleanBuilder>()
            .unwrap()
            .append_value(*b),
        (DataType::Int32, Value::Int(i)) => builder
            .as_any_mut()
            .downcast_mut::<Int32Builder>()
            .unwrap()
            .append_value(i32::try_from(*i).unwrap_or(i32::MAX)),
        (DataType::Int64, Value::Int(i)) => builder
            .as_any_mut()
            .downcast_mut::<Int64Builder>()
            .unwrap()
            .append_value(*i),
        (DataType::Float32, Value::Float(f)) => builder
            .as_any_mut()
            .downcast_mut::<Float32Builder>()
            .unwrap()
            .append_value(*f as f32),
        (DataType::Float64, Value::Float(f)) => builder
            .as_any_mut()
            .downcast_mut::<Float64Builder>()
            .unwrap()
            .append_value(*f),
        (DataType::Utf8, Value::String(s)) => builder
            .as_any_mut()
            .downcast_mut::<StringBuilder>()
            .unwrap()
            .append_value(s),
        (DataType::Binary, Value::Bytes(b)) => builder
            .as_any_mut()
            .downcast_mut::<BinaryBuilder>()
            .unwrap()
            .append_value(b),
        (DataType::Date32, Value::Int(days)) => builder
            .as_any_mut()
            .downcast_mut::<Date32Builder>()
            .unwrap()
            .append_value(i32::try_from(*days).unwrap_or_default()),
        (DataType::Timestamp(_, _), Value::Int(micros)) => builder
            .as_any_mut()
            .downcast_mut::<TimestampMicrosecondBuilder>()
            .unwrap()
            .append_value(*micros),
        (DataType::Struct(fields), Value::Span(span)) if fields.len() == 2 => {
            append_span(builder, span);
        }
        (DataType::Struct(_), Value::Struct(map)) => {
            let sb = builder.as_any_mut().downcast_mut::<StructBuilder>().unwrap();
            append_struct_fields(sb, map);
            sb.append(true);
        }
        (DataType::List(item_field), Value::Repeated(items)) => {
            append_list(builder, item_field.data_type(), items);
        }
        (DataType::List(_), Value::Embedding(chunks)) => {
            append_embedding(builder, chunks);
        }
        (dt, v) => panic!("value {v:?} does not match arrow type {dt:?}"),
    }
}

fn append_span(builder: &mut dyn ArrayBuilder, span: &Span) {
    let sb = builder.as_any_mut().downcast_mut::<StructBuilder>().unwrap();
    sb.field_builder::<Int32Builder>(0)
        .unwrap()
        .append_value(i32::try_from(span.start).unwrap_or_default());
    sb.field_builder::<Int32Builder>(1)
        .unwrap()
        .append_value(i32::try_from(span.end).unwrap_or_default());
    sb.append(true);
}

fn append_struct_fields(sb: &mut StructBuilder, map: &std::collections::BTreeMap<String, Value>) {
    // Field order in `map` (BTreeMap, sorted) must match the order the
    // struct's Arrow schema was built with (`field_to_arrow`'s BTreeMap
    // iteration) for index-based `field_builder` lookups to land correctly.
    for (i, value) in map.values().enumerate() {
        if let Some(b) = sb.field_builder::<BooleanBuilder>(i) {
            if let Value::Bool(v) = value {
                b.append_value(*v);
            } else {
                b.append_null();
            }
        } else if let Some(b) = sb.field_builder::<Int64Builder>(i) {
            if let Value::Int(v) = value {
                b.append_value(*v);
            } else {
                b.append_null();
            }
        } else if let Some(b) = sb.field_builder::<Float64Builder>(i) {
            if let Value::Float(v) = value {
                b.append_value(*v);
            } else {
                b.append_null();
            }
        } else if let Some(b) = sb.field_builder::<StringBuilder>(i) {
            if let Value::String(v) = value {
                b.append_value(v);
            } else {
                b.append_null();
            }
        }
    }
}

fn append_list(builder: &mut dyn ArrayBuilder, item_type: &DataType, items: &[Value]) {
    let lb = builder
        .as_any_mut()
        .downcast_mut::<ListBuilder<Box<dyn ArrayBuilder>>>()
        .unwrap();
    for item in items {
        append_value(lb.values(), item_type, item);
    }
    lb.append(true);
}

fn append_embedding(builder: &mut dyn ArrayBuilder, chunks: &[EmbeddingChunk]) {
    let lb = builder
        .as_any_mut()
        .downcast_mut::<ListBuilder<Box<dyn ArrayBuilder>>>()
        .unwrap();
    for chunk in chunks {
        let chunk_builder = lb
            .values()
            .as_any_mut()
            .downcast_mut::<StructBuilder>()
            .unwrap();
        {
            let span_builder = chunk_builder.field_builder::<StructBuilder>(0).unwrap();
            span_builder
                .field_builder::<Int32Builder>(0)
                .unwrap()
                .append_value(i32::try_from(chunk.span.start).unwrap_or_default());
            span_builder
                .field_builder::<Int32Builder>(1)
                .unwrap()
                .append_value(i32::try_from(chunk.span.end).unwrap_or_default());
            span_builder.append(true);
        }
        let vector_builder = chunk_builder
            .field_builder::<ListBuilder<Box<dyn ArrayBuilder>>>(1)
            .unwrap();
        for component in &chunk.vector {
            vector_builder
                .values()
                .as_any_mut()
                .downcast_mut::<Float32Builder>()
                .unwrap()
                .append_value(*component);
        }
        vector_builder.append(true);
        chunk_builder.append(true);
    }
    lb.append(true);
}

/// Reads back a single cell of `array` at `row` into a `Value`, using
/// `dtype` (the original Lilac leaf dtype, for the int8/float16 widening
/// that Arrow storage collapsed).
#[must_use]
pub fn array_value(array: &ArrayRef, row: usize, dtype: Option<DType>) -> Value {
    if array.is_null(row) {
        return Value::Null;
    }
    match array.data_type() {
        DataType::Boolean => Value::Bool(
            array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .unwrap()
                .value(row),
        ),
        DataType::Int32 => Value::Int(i64::from(
            array
                .as_any()
                .downcast_ref::<arrow_array::Int32Array>()
                .unwrap()
                .value(row),
        )),
        DataType::Int64 => Value::Int(
            array
                .as_any()
                .downcast_ref::<arrow_array::Int64Array>()
                .unwrap()
                .value(row),
        ),
        DataType::Float32 => Value::Float(f64::from(
            array
                .as_any()
                .downcast_ref::<arrow_array::Float32Array>()
                .unwrap()
                .value(row),
        )),
        DataType::Float64 => Value::Float(
            array
                .as_any()
                .downcast_ref::<arrow_array::Float64Array>()
                .unwrap()
                .value(row),
        ),
        DataType::Utf8 => Value::String(
            array
                .as_any()
                .downcast_ref::<arrow_array::StringArray>()
                .unwrap()
                .value(row)
                .to_string(),
        ),
        DataType::Binary => Value::Bytes(
            array
                .as_any()
                .downcast_ref::<arrow_array::BinaryArray>()
                .unwrap()
                .value(row)
                .to_vec(),
        ),
        DataType::Date32 => Value::Int(i64::from(
            array
                .as_any()
                .downcast_ref::<arrow_array::Date32Array>()
                .unwrap()
                .value(row),
        )),
        DataType::Timestamp(_, _) => Value::Int(
            array
                .as_any()
                .downcast_ref::<arrow_array::TimestampMicrosecondArray>()
                .unwrap()
                .value(row),
        ),
        DataType::Struct(_) if dtype == Some(DType::Span) => {
            let sa = array.as_any().downcast_ref::<StructArray>().unwrap();
            let start = sa
                .column(0)
                .as_any()
                .downcast_ref::<arrow_array::Int32Array>()
                .unwrap()
                .value(row);
            let end = sa
                .column(1)
                .as_any()
                .downcast_ref::<arrow_array::Int32Array>()
                .unwrap()
                .value(row);
            Value::Span(Span {
                start: start as usize,
                end: end as usize,
            })
        }
        DataType::Struct(fields) => {
            let sa = array.as_any().downcast_ref::<StructArray>().unwrap();
            let mut out = std::collections::BTreeMap::new();
            for (i, f) in fields.iter().enumerate() {
                out.insert(f.name().clone(), array_value(sa.column(i), row, None));
            }
            Value::Struct(out)
        }
        DataType::List(_) if dtype == Some(DType::Embedding) => {
            Value::Embedding(read_embedding_list(array, row))
        }
        DataType::List(item_field) => {
            let la = array
                .as_any()
                .downcast_ref::<arrow_array::ListArray>()
                .unwrap();
            let inner = la.value(row);
            let item_dtype = if matches!(item_field.data_type(), DataType::Struct(f) if f.len() == 2) {
                Some(DType::Span)
            } else {
                None
            };
            let items = (0..inner.len())
                .map(|i| array_value(&inner, i, item_dtype))
                .collect();
            Value::Repeated(items)
        }
        other => panic!("unsupported arrow data type on read: {other:?}"),
    }
}

fn read_embedding_list(array: &ArrayRef, row: usize) -> Vec<EmbeddingChunk> {
    let la = array
        .as_any()
        .downcast_ref::<arrow_array::ListArray>()
        .unwrap();
    let chunks = la.value(row);
    let chunk_struct = chunks.as_any().downcast_ref::<StructArray>().unwrap();
    (0..chunk_struct.len())
        .map(|i| {
            let span_col = chunk_struct.column(0);
            let span_struct = span_col.as_any().downcast_ref::<StructArray>().unwrap();
            let start = span_struct
                .column(0)
                .as_any()
                .downcast_ref::<arrow_array::Int32Array>()
                .unwrap()
                .value(i);
            let end = span_struct
                .column(1)
                .as_any()
                .downcast_ref::<arrow_array::Int32Array>()
                .unwrap()
                .value(i);
            let vector_col = chunk_struct.column(1);
            let vector_list = vector_col
                .as_any()
                .downcast_ref::<arrow_array::ListArray>()
                .unwrap();
            let vector_values = vector_list.value(i);
            let vector_array = vector_values
                .as_any()
                .downcast_ref::<arrow_array::Float32Array>()
                .unwrap();
            EmbeddingChunk {
                span: Span {
                    start: start as usize,
                    end: end as usize,
                },
                vector: vector_array.values().to_vec(),
            }
        })
        .collect()
}
