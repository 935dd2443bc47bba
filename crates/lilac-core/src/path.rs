//! Paths: ordered sequences of field names, repeated-wildcards, or explicit
//! indices, used both as query-time selectors and as signal write templates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PathComponent {
    /// A named struct field.
    Name(String),
    /// `*` — every element at this list level.
    Wildcard,
    /// An explicit integer index into a repeated field.
    Index(usize),
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(n) => f.write_str(n),
            Self::Wildcard => f.write_str("*"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// An ordered sequence of [`PathComponent`]s addressing one or many schema
/// leaves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(transparent)]
pub struct Path(pub Vec<PathComponent>);

impl Path {
    #[must_use]
    pub fn new(components: Vec<PathComponent>) -> Self {
        Self(components)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[PathComponent] {
        &self.0
    }

    /// Number of `*` wildcard components — the list nesting depth a signal
    /// reading/writing at this path must traverse.
    #[must_use]
    pub fn wildcard_depth(&self) -> usize {
        self.0
            .iter()
            .filter(|c| matches!(c, PathComponent::Wildcard))
            .count()
    }

    /// Append a component, returning a new path (paths are cheap to extend
    /// when computing sibling enrichment paths).
    #[must_use]
    pub fn joined(&self, component: PathComponent) -> Self {
        let mut components = self.0.clone();
        components.push(component);
        Self(components)
    }

    /// The final name component, if the path ends in a named field (used to
    /// derive default enrichment output names: `{input_leaf}__{signal.name}`).
    #[must_use]
    pub fn leaf_name(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|c| match c {
            PathComponent::Name(n) => Some(n.as_str()),
            _ => None,
        })
    }

    /// All but the last component, i.e. the parent path that a sibling
    /// field is written under.
    #[must_use]
    pub fn parent(&self) -> Self {
        let mut components = self.0.clone();
        components.pop();
        Self(components)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Parse a dot-separated path string (`"a.b.*.c"`) or build one from
/// explicit components, producing a canonical [`Path`].
///
/// Bare integers become [`PathComponent::Index`]; `*` becomes
/// [`PathComponent::Wildcard`]; everything else is a [`PathComponent::Name`].
#[must_use]
pub fn normalize_path(input: &str) -> Path {
    if input.is_empty() {
        return Path::default();
    }
    let components = input
        .split('.')
        .map(|segment| {
            if segment == "*" {
                PathComponent::Wildcard
            } else if let Ok(idx) = segment.parse::<usize>() {
                PathComponent::Index(idx)
            } else {
                PathComponent::Name(segment.to_string())
            }
        })
        .collect();
    Path(components)
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        normalize_path(value)
    }
}

impl From<Vec<&str>> for Path {
    fn from(value: Vec<&str>) -> Self {
        Path(
            value
                .into_iter()
                .map(|segment| {
                    if segment == "*" {
                        PathComponent::Wildcard
                    } else if let Ok(idx) = segment.parse::<usize>() {
                        PathComponent::Index(idx)
                    } else {
                        PathComponent::Name(segment.to_string())
                    }
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_wildcards_and_indices() {
        let path = normalize_path("messages.*.text");
        assert_eq!(
            path.0,
            vec![
                PathComponent::Name("messages".into()),
                PathComponent::Wildcard,
                PathComponent::Name("text".into()),
            ]
        );
        assert_eq!(path.wildcard_depth(), 1);
        assert_eq!(path.leaf_name(), Some("text"));
    }

    #[test]
    fn normalize_empty_string_is_empty_path() {
        assert!(normalize_path("").is_empty());
    }

    #[test]
    fn display_roundtrips_through_normalize() {
        let original = "a.*.b.0";
        let path = normalize_path(original);
        assert_eq!(path.to_string(), original);
    }

    #[test]
    fn parent_drops_last_component() {
        let path = normalize_path("a.b.c");
        assert_eq!(path.parent().to_string(), "a.b");
    }
}
