//! `create_enrichment_schema`: wraps a signal's output fields in the nesting
//! implied by the path it was computed over, and attaches the
//! `SignalDescriptor` at the wrap's root (spec.md §4.A, §4.E).

use lilac_core::{Field, Path, PathComponent, SignalDescriptor};

/// Build the schema fragment a signal enrichment contributes when applied at
/// `source_path`.
///
/// `output_fields` is the signal's own declared output shape (e.g. a
/// text-statistics signal's `{num_words: int32}`). If `source_path` walks
/// through one or more `Wildcard` components (the signal ran over a repeated
/// field), the result is wrapped in a matching chain of `repeated_field`s so
/// the enrichment column lines up positionally with its source when flattened
/// (see `lilac_core::flatten`).
#[must_use]
pub fn create_enrichment_schema(
    output_fields: Field,
    source_path: &Path,
    descriptor: SignalDescriptor,
) -> Field {
    let wildcard_depth = source_path.wildcard_depth();
    let mut wrapped = output_fields;
    for _ in 0..wildcard_depth {
        wrapped = Field::repeated(wrapped);
    }
    wrapped.signal = Some(descriptor);
    wrapped
}

/// Convenience for signals whose output is a single leaf dtype rather than a
/// struct (e.g. an embedding signal producing a bare `embedding` column).
#[must_use]
pub fn create_leaf_enrichment_schema(
    output: lilac_core::DType,
    source_path: &Path,
    descriptor: SignalDescriptor,
) -> Field {
    create_enrichment_schema(Field::leaf(output), source_path, descriptor)
}

/// True if `path`'s final component names a signal output nested anywhere
/// under a `repeated_field` chain rather than directly under a struct —
/// used by the executor to decide whether per-item results need flatten
/// alignment before writing back.
#[must_use]
pub fn is_repeated_path(path: &Path) -> bool {
    path.as_slice()
        .iter()
        .any(|c| matches!(c, PathComponent::Wildcard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::{normalize_path, DType};
    use std::collections::BTreeMap;

    fn descriptor() -> SignalDescriptor {
        SignalDescriptor {
            signal_name: "text-statistics".into(),
            signal_args: serde_json::json!({}),
        }
    }

    #[test]
    fn scalar_source_path_produces_unwrapped_schema() {
        let mut fields = BTreeMap::new();
        fields.insert("num_words".to_string(), Field::leaf(DType::Int32));
        let output = Field::struct_(fields);

        let schema = create_enrichment_schema(output, &normalize_path("text"), descriptor());
        assert!(schema.is_struct());
        assert!(schema.signal.is_some());
    }

    #[test]
    fn wildcard_source_path_wraps_output_in_repeated() {
        let mut fields = BTreeMap::new();
        fields.insert("num_words".to_string(), Field::leaf(DType::Int32));
        let output = Field::struct_(fields);

        let schema =
            create_enrichment_schema(output, &normalize_path("paragraphs.*.text"), descriptor());
        assert!(schema.is_repeated());
        assert_eq!(schema.signal.as_ref().unwrap().signal_name, "text-statistics");

        let inner = schema.repeated_field.unwrap();
        assert!(inner.is_struct());
    }

    #[test]
    fn is_repeated_path_detects_wildcard_components() {
        assert!(is_repeated_path(&normuparth()));
        assert!(!is_repeated_path(&normalize_path("text")));
    }

    fn normuparth() -> lilac_core::Path {
        normalize_path("paragraphs.*.text")
    }
}
