//! `merge(a, b)`: unions two schema trees' struct fields recursively, failing
//! on dtype conflict (spec.md §4.A).

use lilac_core::Field;

use crate::error::SchemaError;

/// Recursively union `a` and `b`. Struct fields present in only one side
/// pass through unchanged; fields present in both must have identical
/// dtype/struct/repeated shape or this returns `SchemaError::DtypeConflict`.
///
/// Associative: `merge(merge(a,b),c) == merge(a,merge(b,c))` whenever no
/// conflict exists anywhere in the union (Testable Properties, spec.md §8).
pub fn merge(a: &Field, b: &Field) -> Result<Field, SchemaError> {
    merge_at(a, b, "")
}

fn merge_at(a: &Field, b: &Field, path: &str) -> Result<Field, SchemaError> {
    match (&a.fields, &b.fields) {
        (Some(a_fields), Some(b_fields)) => {
            let mut merged = a_fields.clone();
            for (name, b_field) in b_fields {
                let child_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{path}.{name}")
                };
                match merged.get(name) {
                    Some(a_field) => {
                        let merged_field = merge_at(a_field, b_field, &child_path)?;
                        merged.insert(name.clone(), merged_field);
                    }
                    None => {
                        merged.insert(name.clone(), b_field.clone());
                    }
                }
            }
            Ok(Field::struct_(merged))
        }
        (None, None) => match (&a.repeated_field, &b.repeated_field) {
            (Some(a_inner), Some(b_inner)) => {
                let merged_inner = merge_at(a_inner, b_inner, &format!("{path}.*"))?;
                Ok(Field::repeated(merged_inner))
            }
            (None, None) => {
                let (a_dtype, b_dtype) = (a.dtype, b.dtype);
                if a_dtype == b_dtype {
                    let mut result = a.clone();
                    // A signal descriptor on either side wins; identical
                    // leaves without provenance merge to a plain leaf.
                    result.signal = a.signal.clone().or_else(|| b.signal.clone());
                    result.cluster = a.cluster.clone().or_else(|| b.cluster.clone());
                    result.categorical = a.categorical || b.categorical;
                    Ok(result)
                } else {
                    Err(SchemaError::DtypeConflict {
                        path: path.to_string(),
                        left: a_dtype.map_or_else(|| "none".to_string(), |d| d.to_string()),
                        right: b_dtype.map_or_else(|| "none".to_string(), |d| d.to_string()),
                    })
                }
            }
            _ => Err(SchemaError::DtypeConflict {
                path: path.to_string(),
                left: "repeated-shape-mismatch".to_string(),
                right: "repeated-shape-mismatch".to_string(),
            }),
        },
        _ => Err(SchemaError::DtypeConflict {
            path: path.to_string(),
            left: "struct-shape-mismatch".to_string(),
            right: "struct-shape-mismatch".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::DType;
    use std::collections::BTreeMap;

    fn struct_field(fields: Vec<(&str, Field)>) -> Field {
        Field::struct_(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn merge_unions_disjoint_struct_fields() {
        let a = struct_field(vec![("text", Field::leaf(DType::String))]);
        let b = struct_field(vec![("score", Field::leaf(DType::Float32))]);
        let merged = merge(&a, &b).unwrap();
        let fields = merged.fields.unwrap();
        assert!(fields.contains_key("text"));
        assert!(fields.contains_key("score"));
    }

    #[test]
    fn merge_fails_on_dtype_conflict() {
        let a = struct_field(vec![("text", Field::leaf(DType::String))]);
        let b = struct_field(vec![("text", Field::leaf(DType::Int32))]);
        assert!(merge(&a, &b).is_err());
    }

    #[test]
    fn merge_is_associative_without_conflicts() {
        let a = struct_field(vec![("a", Field::leaf(DType::String))]);
        let b = struct_field(vec![("b", Field::leaf(DType::Int32))]);
        let c = struct_field(vec![("c", Field::leaf(DType::Bool))]);

        let left = merge(&merge(&a, &b).unwrap(), &c).unwrap();
        let right = merge(&a, &merge(&b, &c).unwrap()).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn merge_combines_nested_repeated_structs() {
        let inner_a = struct_field(vec![("x", Field::leaf(DType::Int32))]);
        let inner_b = struct_field(vec![("y", Field::leaf(DType::Int32))]);
        let a = struct_field(vec![("items", Field::repeated(inner_a))]);
        let b = struct_field(vec![("items", Field::repeated(inner_b))]);
        let merged = merge(&a, &b).unwrap();
        let items = merged.fields.unwrap().remove("items").unwrap();
        let inner = *items.repeated_field.unwrap();
        let inner_fields = inner.fields.unwrap();
        assert!(inner_fields.contains_key("x"));
        assert!(inner_fields.contains_key("y"));
    }

    #[test]
    fn unused_btreemap_import_guard() {
        // exercise BTreeMap import path used by struct_field helper above
        let _: BTreeMap<String, Field> = BTreeMap::new();
    }
}
