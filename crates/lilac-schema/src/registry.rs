//! Central JSON Schema registry for Lilac's core types.
//!
//! The `SchemaRegistry` builds JSON Schemas from `lilac-core` types at
//! construction time using [`schemars::schema_for!`] and provides lookup and
//! validation via `jsonschema`. This is the registry a dataset manifest's
//! `Field` tree is validated against, and the basis for validating signal
//! output payloads before they're merged into a dataset's schema.

use std::collections::HashMap;

use lilac_core::{ClusterDescriptor, Field, Path, RowId, SignalDescriptor};
use schemars::schema_for;

use crate::error::SchemaError;

/// Central store of JSON Schemas for Lilac's core types.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, serde_json::Value>,
}

/// Insert a schema into the map, converting the `schemars` output to a
/// `serde_json::Value`. Panics if `serde_json::to_value` fails (should be
/// infallible for valid `schemars` output).
macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {
        $map.insert($name, serde_json::to_value(schema_for!($ty)).unwrap());
    };
}

impl SchemaRegistry {
    /// Build a new registry containing schemas for every core type a dataset
    /// manifest, signal descriptor, or query result can be made of.
    ///
    /// # Panics
    ///
    /// Panics if `serde_json::to_value` fails on any `schemars`-generated
    /// schema. This is not expected in practice because `schemars` always
    /// produces valid JSON-serialisable output.
    #[must_use]
    pub fn new() -> Self {
        let mut schemas = HashMap::new();

        register!(schemas, "field", Field);
        register!(schemas, "path", Path);
        register!(schemas, "row_id", RowId);
        register!(schemas, "signal_descriptor", SignalDescriptor);
        register!(schemas, "cluster_descriptor", ClusterDescriptor);

        Self { schemas }
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name)
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` if the schema name is unknown, or
    /// `SchemaError::ValidationFailed` if validation produces errors.
    pub fn validate(&self, name: &str, instance: &serde_json::Value) -> Result<(), SchemaError> {
        let schema = self
            .get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;

        let validator = jsonschema::validator_for(schema)
            .map_err(|e| SchemaError::Generation(format!("{e}")))?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{e}"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed { errors })
        }
    }

    /// Validate an arbitrary dataset manifest `Field` tree against the
    /// `"field"` meta-schema, rather than validating an *instance* of data
    /// against a `Field`-derived schema. Used when a manifest is loaded from
    /// disk or received from a remote signal descriptor.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::ValidationFailed` if `field` does not itself
    /// look like a well-formed `Field` node once serialized to JSON.
    pub fn validate_field(&self, field: &Field) -> Result<(), SchemaError> {
        let instance = serde_json::to_value(field).map_err(|e| SchemaError::Generation(e.to_string()))?;
        self.validate("field", &instance)
    }

    /// List all registered schema names.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::DType;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
    }

    #[test]
    fn registry_has_expected_count() {
        assert_eq!(registry().schema_count(), 5);
    }

    #[test]
    fn get_existing_and_missing_schema() {
        let reg = registry();
        assert!(reg.get("field").is_some());
        assert!(reg.get("nonexistent").is_none());
    }

    #[test]
    fn validate_field_accepts_well_formed_field() {
        let reg = registry();
        let field = Field::leaf(DType::String);
        assert!(reg.validate_field(&field).is_ok());
    }

    #[test]
    fn validate_nonexistent_schema_returns_not_found() {
        let reg = registry();
        let result = reg.validate("bogus", &serde_json::json!({}));
        assert!(matches!(result, Err(SchemaError::NotFound(_))));
    }

    #[test]
    fn list_is_sorted() {
        let reg = registry();
        let names = reg.list();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
