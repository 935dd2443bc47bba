//! The recursive `Field` tree: Lilac's typed hierarchical schema node.
//!
//! A closed sum over dtype/struct/repeated, carrying provenance (`signal`,
//! `cluster`) as optional sidecars — see DESIGN NOTES §9 ("Dynamic typing →
//! tagged Field tree").

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dtype::DType;

/// Records which signal instance produced an enrichment field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SignalDescriptor {
    /// The signal's registered name, e.g. `"text-statistics"`, `"gte-small"`.
    pub signal_name: String,
    /// The signal's constructor arguments, serialized — used to detect
    /// whether a re-run with `overwrite=false` is the same instance
    /// (spec.md §4.E "Idempotence").
    pub signal_args: serde_json::Value,
}

/// Records the clustering parameters that produced a cluster enrichment
/// field (spec.md §4.F).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterDescriptor {
    pub min_cluster_size: usize,
    /// The embedding path this cluster field was computed from.
    pub input_path: crate::path::Path,
    /// Whether clustering ran against a remote ("garden") collaborator.
    pub remote: bool,
}

/// A node in the recursive schema tree.
///
/// Exactly one of `dtype`, `fields`, or `repeated_field` is set for a given
/// node (enforced by [`Field::is_leaf`]/constructors, not by the type system,
/// mirroring the closed-but-dynamically-checked shape of the source schema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Field {
    /// Set when this node is a leaf (primitive or special dtype).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dtype: Option<DType>,
    /// Set when this node is a struct; maps field name to child `Field`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fields: Option<BTreeMap<String, Field>>,
    /// Set when this node is a repeated (list) field.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repeated_field: Option<Box<Field>>,
    /// Whether a string leaf should be treated as a bounded category set.
    #[serde(default)]
    pub categorical: bool,
    /// Present iff this field was produced by a signal (enrichment column).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signal: Option<SignalDescriptor>,
    /// Present iff this field holds cluster assignment metadata.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cluster: Option<ClusterDescriptor>,
}

impl Field {
    /// A leaf field of the given dtype.
    #[must_use]
    pub fn leaf(dtype: DType) -> Self {
        Self {
            dtype: Some(dtype),
            ..Self::default()
        }
    }

    /// A struct field from named children.
    #[must_use]
    pub fn struct_(fields: BTreeMap<String, Field>) -> Self {
        Self {
            fields: Some(fields),
            ..Self::default()
        }
    }

    /// A repeated (list) field wrapping `inner`.
    #[must_use]
    pub fn repeated(inner: Field) -> Self {
        Self {
            repeated_field: Some(Box::new(inner)),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.dtype.is_some()
    }

    #[must_use]
    pub const fn is_struct(&self) -> bool {
        self.fields.is_some()
    }

    #[must_use]
    pub const fn is_repeated(&self) -> bool {
        self.repeated_field.is_some()
    }

    /// Attach a signal descriptor, returning `self` (builder style, used by
    /// `create_enrichment_schema`).
    #[must_use]
    pub fn with_signal(mut self, descriptor: SignalDescriptor) -> Self {
        self.signal = Some(descriptor);
        self
    }

    /// Attach a cluster descriptor, returning `self`.
    #[must_use]
    pub fn with_cluster(mut self, descriptor: ClusterDescriptor) -> Self {
        self.cluster = Some(descriptor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_struct_repeated_are_mutually_distinguishable() {
        let leaf = Field::leaf(DType::String);
        assert!(leaf.is_leaf());
        assert!(!leaf.is_struct());

        let repeated = Field::repeated(Field::leaf(DType::Int32));
        assert!(repeated.is_repeated());
        assert!(!repeated.is_leaf());
    }

    #[test]
    fn field_roundtrips_through_json() {
        let field = Field::leaf(DType::Embedding).with_signal(SignalDescriptor {
            signal_name: "gte-small".into(),
            signal_args: serde_json::json!({}),
        });
        let json = serde_json::to_string(&field).unwrap();
        let back: Field = serde_json::from_str(&json).unwrap();
        assert_eq!(field, back);
    }
}
