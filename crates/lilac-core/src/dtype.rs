//! The closed set of primitive and special dtypes a [`crate::field::Field`] leaf
//! can carry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A leaf dtype: either a primitive value type or one of the two specials
/// (`Span`, `Embedding`) described in spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
    String,
    Bytes,
    Timestamp,
    Date,
    Interval,
    /// `{start, end}` character offsets within a sibling string value.
    Span,
    /// A dense float vector, non-queryable in user filters, stored out-of-line.
    Embedding,
}

impl DType {
    /// Whether this dtype participates in ordering/filter comparisons.
    ///
    /// Embeddings are not queryable in user filters (spec.md §3); spans are
    /// addressable but not orderable outside `any`/`all` span-overlap checks.
    #[must_use]
    pub const fn is_comparable(self) -> bool {
        !matches!(self, Self::Embedding | Self::Span)
    }

    /// Whether this dtype is a floating-point numeric type.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }

    /// Whether this dtype is an integer numeric type.
    #[must_use]
    pub const fn is_int(self) -> bool {
        matches!(
            self,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64
        )
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Interval => "interval",
            Self::Span => "span",
            Self::Embedding => "embedding",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_not_comparable() {
        assert!(!DType::Embedding.is_comparable());
        assert!(!DType::Span.is_comparable());
        assert!(DType::Int32.is_comparable());
    }

    #[test]
    fn display_matches_serde_rename() {
        assert_eq!(DType::Float32.to_string(), "float32");
        assert_eq!(
            serde_json::to_string(&DType::Float32).unwrap(),
            "\"float32\""
        );
    }
}
