//! Runtime row values: the dynamically-typed counterpart to [`crate::field::Field`].
//!
//! A `Field` says what shape a leaf *must* have; a `Value` is what a given
//! row actually carries at that leaf, including the absent-value convention
//! for structurally-present-but-missing data (spec.md §3 "Invariants").

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A character-offset span within a sibling string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// One chunk of an embedding leaf: the span of the source string it covers
/// and the dense vector for that span (spec.md §3 "Embedding leaves store
/// per-chunk entries").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingChunk {
    pub span: Span,
    pub vector: Vec<f32>,
}

/// A runtime leaf value.
///
/// `Absent` is the schema-mandated "structurally present, no value"
/// convention; it is distinct from `Null`, which represents source data that
/// was explicitly null/NaN/NaT before ingestion normalized it (SPEC_FULL.md
/// §3 "Absent-value convention").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Span(Span),
    Embedding(Vec<EmbeddingChunk>),
    Struct(std::collections::BTreeMap<String, Value>),
    Repeated(Vec<Value>),
}

impl Value {
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_repeated(&self) -> Option<&[Value]> {
        match self {
            Self::Repeated(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Absent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_null_are_distinct() {
        assert_ne!(Value::Absent, Value::Null);
        assert!(Value::Absent.is_absent());
        assert!(!Value::Null.is_absent());
    }

    #[test]
    fn span_slices_source_text() {
        let span = Span::new(6, 11);
        assert_eq!(span.slice("hello world"), "world");
    }
}
