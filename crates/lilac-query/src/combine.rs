//! Combine columns: nests sibling `{leaf}__{signal_name}` enrichment
//! columns back under their source leaf, so a caller receives one
//! hierarchical value per source row instead of flat denormalized columns
//! (spec.md §4.G "Combine columns").
//!
//! Grounded on the teacher's `hybrid.rs::combine_results`, repurposed: that
//! function deduplicated two ranked result streams into one by a lowercased
//! name key. Here the "key" every sibling column groups by is the leaf name
//! before its `__` separator, and the "merge" folds them into a struct
//! instead of picking a winner.

use std::collections::BTreeMap;

use lilac_core::{Field, Value};

const VALUE_KEY: &str = "value";

/// Nests a flat row (`{"text": .., "text__text_statistics": ..}`) into
/// (`{"text": {"value": .., "text_statistics": ..}}`). A leaf with no
/// enrichment siblings is left as a bare scalar rather than wrapped in a
/// single-field struct.
#[must_use]
pub fn combine_sibling_columns(row: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut by_root: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
    for (name, value) in row {
        match name.split_once("__") {
            Some((root, suffix)) => {
                by_root.entry(root.to_string()).or_default().insert(suffix.to_string(), value);
            }
            None => {
                by_root.entry(name).or_default().insert(VALUE_KEY.to_string(), value);
            }
        }
    }

    by_root
        .into_iter()
        .map(|(root, mut fields)| {
            if fields.len() == 1 && fields.contains_key(VALUE_KEY) {
                (root, fields.remove(VALUE_KEY).unwrap())
            } else {
                (root, Value::Struct(fields))
            }
        })
        .collect()
}

/// The schema-level counterpart of [`combine_sibling_columns`], used by
/// `select_rows_schema` to preview the nested shape without executing a
/// query.
#[must_use]
pub fn combine_schema_fields(fields: BTreeMap<String, Field>) -> BTreeMap<String, Field> {
    let mut by_root: BTreeMap<String, BTreeMap<String, Field>> = BTreeMap::new();
    for (name, field) in fields {
        match name.split_once("__") {
            Some((root, suffix)) => {
                by_root.entry(root.to_string()).or_default().insert(suffix.to_string(), field);
            }
            None => {
                by_root.entry(name).or_default().insert(VALUE_KEY.to_string(), field);
            }
        }
    }

    by_root
        .into_iter()
        .map(|(root, mut sub)| {
            if sub.len() == 1 && sub.contains_key(VALUE_KEY) {
                (root, sub.remove(VALUE_KEY).unwrap())
            } else {
                (root, Field::struct_(sub))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::DType;

    #[test]
    fn plain_leaf_without_siblings_stays_a_scalar() {
        let mut row = BTreeMap::new();
        row.insert("id".to_string(), Value::String("r0".into()));
        let combined = combine_sibling_columns(row);
        assert_eq!(combined.get("id"), Some(&Value::String("r0".into())));
    }

    #[test]
    fn enrichment_siblings_nest_under_source_leaf() {
        let mut row = BTreeMap::new();
        row.insert("text".to_string(), Value::String("hi".into()));
        row.insert("text__length".to_string(), Value::Int(2));
        let combined = combine_sibling_columns(row);
        let Some(Value::Struct(nested)) = combined.get("text") else {
            panic!("expected nested struct");
        };
        assert_eq!(nested.get("value"), Some(&Value::String("hi".into())));
        assert_eq!(nested.get("length"), Some(&Value::Int(2)));
    }

    #[test]
    fn schema_nesting_mirrors_row_nesting() {
        let mut fields = BTreeMap::new();
        fields.insert("text".to_string(), Field::leaf(DType::String));
        fields.insert("text__length".to_string(), Field::leaf(DType::Int32));
        let combined = combine_schema_fields(fields);
        assert!(combined.get("text").unwrap().is_struct());
    }
}
