//! Filter predicates over projected row values (spec.md §4.B).

use lilac_core::{Path, Value};
use serde::{Deserialize, Serialize};

/// A filter operator, applied to the value(s) at a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Le(Value),
    Gt(Value),
    Ge(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Exists,
    /// SQL-style wildcard match (`%`/`_`) against a string value.
    Like(String),
}

/// How a filter applies when its path runs through a repeated field: `Any`
/// requires at least one element to satisfy the operator, `All` requires
/// every element to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepeatedModifier {
    #[default]
    Any,
    All,
}

/// A single filter clause: `path op value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub path: Path,
    pub op: FilterOp,
    #[serde(default)]
    pub modifier: RepeatedModifier,
}

impl Filter {
    #[must_use]
    pub fn new(path: Path, op: FilterOp) -> Self {
        Self {
            path,
            op,
            modifier: RepeatedModifier::Any,
        }
    }

    /// Evaluate this filter's operator against a single resolved value
    /// (already indexed through any repeated components of `path`).
    #[must_use]
    pub fn matches_scalar(&self, value: &Value) -> bool {
        matches_op(&self.op, value)
    }

    /// Evaluate against every value produced by a repeated field, combining
    /// per-element results according to `modifier`.
    #[must_use]
    pub fn matches_repeated(&self, values: &[Value]) -> bool {
        match self.modifier {
            RepeatedModifier::Any => values.iter().any(|v| self.matches_scalar(v)),
            RepeatedModifier::All => !values.is_empty() && values.iter().all(|v| self.matches_scalar(v)),
        }
    }
}

fn matches_op(op: &FilterOp, value: &Value) -> bool {
    match op {
        FilterOp::Eq(target) => value == target,
        FilterOp::Ne(target) => value != target,
        FilterOp::Lt(target) => compare(value, target) == Some(std::cmp::Ordering::Less),
        FilterOp::Le(target) => matches!(
            compare(value, target),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        FilterOp::Gt(target) => compare(value, target) == Some(std::cmp::Ordering::Greater),
        FilterOp::Ge(target) => matches!(
            compare(value, target),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        FilterOp::In(targets) => targets.contains(value),
        FilterOp::NotIn(targets) => !targets.contains(value),
        FilterOp::Exists => !value.is_absent() && !value.is_null(),
        FilterOp::Like(pattern) => value
            .as_str()
            .is_some_and(|s| like_match(pattern, s)),
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::String(x), Value::String(y)) => x.partial_cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.partial_cmp(y),
        _ => None,
    }
}

/// SQL-`LIKE` matching: `%` matches any run of characters, `_` matches
/// exactly one.
fn like_match(pattern: &str, text: &str) -> bool {
    fn inner(pattern: &[char], text: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some(('%', rest)) => {
                (0..=text.len()).any(|i| inner(rest, &text[i..]))
            }
            Some(('_', rest)) => !text.is_empty() && inner(rest, &text[1..]),
            Some((c, rest)) => text.first() == Some(c) && inner(rest, &text[1..]),
        }
    }
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();
    inner(&pattern_chars, &text_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::normalize_path;

    #[test]
    fn eq_and_ordering_operators() {
        let filter = Filter::new(normalize_path("score"), FilterOp::Ge(Value::Int(3)));
        assert!(filter.matches_scalar(&Value::Int(5)));
        assert!(!filter.matches_scalar(&Value::Int(2)));
    }

    #[test]
    fn like_supports_percent_and_underscore_wildcards() {
        assert!(like_match("hel%", "hello"));
        assert!(like_match("h_llo", "hello"));
        assert!(!like_match("help", "hello"));
    }

    #[test]
    fn exists_excludes_absent_and_null() {
        let filter = Filter::new(normalize_path("x"), FilterOp::Exists);
        assert!(!filter.matches_scalar(&Value::Absent));
        assert!(!filter.matches_scalar(&Value::Null));
        assert!(filter.matches_scalar(&Value::Int(0)));
    }

    #[test]
    fn repeated_any_and_all_modifiers() {
        let mut filter = Filter::new(normalize_path("tags.*"), FilterOp::Eq(Value::String("a".into())));
        let values = vec![Value::String("a".into()), Value::String("b".into())];
        assert!(filter.matches_repeated(&values));
        filter.modifier = RepeatedModifier::All;
        assert!(!filter.matches_repeated(&values));
    }
}
