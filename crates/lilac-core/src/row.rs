//! Row IDs: the stable, globally unique join key across shards, enrichment
//! columns, and the vector index.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque stable string identifying a row across every shard, column, and
/// index that references it. Assigned once at source ingestion and never
/// reused or mutated (spec.md §3 "Row ID").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RowId(pub String);

impl RowId {
    /// Mint a fresh row id for a newly ingested row.
    ///
    /// UUIDv4 is used rather than a content hash: source rows may be
    /// byte-identical (duplicate text) yet must still receive distinct ids,
    /// since row id uniqueness — not content addressing — is the only
    /// invariant the rest of the system relies on.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = RowId::generate();
        let b = RowId::generate();
        assert_ne!(a, b);
    }
}
