//! Universal flatten/unflatten: turn an arbitrarily nested [`Value`] tree into
//! a flat 1-D sequence of leaves plus a `Trail` that remembers how to
//! reconstruct the original nesting (spec.md §4.E step 3, §9 "Generator-heavy
//! pipelines → explicit streams with restartable iterators").
//!
//! Passing the trail alongside the flattened values means a second read of
//! the input is never needed just to learn its shape.

use crate::value::Value;

/// Remembers the nesting shape of a flattened value so `unflatten` can
/// rebuild it without re-reading the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trail {
    /// A single leaf value occupied this position.
    Leaf,
    /// A list of `children.len()` positions, each with its own trail.
    List(Vec<Trail>),
}

/// Flatten `value` into `(leaves, trail)`. `leaves` is the depth-first
/// sequence of non-list values; `trail` records the list nesting needed to
/// reconstruct the original tree via [`unflatten`].
#[must_use]
pub fn flatten(value: &Value) -> (Vec<Value>, Trail) {
    match value {
        Value::Repeated(items) => {
            let mut leaves = Vec::new();
            let mut children = Vec::with_capacity(items.len());
            for item in items {
                let (mut item_leaves, item_trail) = flatten(item);
                leaves.append(&mut item_leaves);
                children.push(item_trail);
            }
            (leaves, Trail::List(children))
        }
        other => (vec![other.clone()], Trail::Leaf),
    }
}

/// Rebuild a value from a flat `leaves` sequence and a `trail` produced by
/// [`flatten`] (or by running the same computation over the same shape, when
/// `leaves` holds *results* rather than the original values).
///
/// # Panics
///
/// Panics if `leaves` has fewer elements than `trail` has leaf positions —
/// this indicates a mismatched trail/leaves pair, an internal invariant
/// violation rather than a recoverable error.
#[must_use]
pub fn unflatten(leaves: &[Value], trail: &Trail) -> Value {
    let mut iter = leaves.iter().cloned();
    unflatten_from(&mut iter, trail)
}

fn unflatten_from(iter: &mut impl Iterator<Item = Value>, trail: &Trail) -> Value {
    match trail {
        Trail::Leaf => iter
            .next()
            .expect("unflatten: fewer leaves than trail expects"),
        Trail::List(children) => {
            Value::Repeated(children.iter().map(|child| unflatten_from(iter, child)).collect())
        }
    }
}

/// Split `items` into consecutive chunks of at most `batch_size`, preserving
/// order. Used by the executor to batch flattened leaves at
/// `local_batch_size` before calling `compute` (spec.md §4.E step 3,
/// Testable Properties scenario 2).
#[must_use]
pub fn batched<T: Clone>(items: &[T], batch_size: usize) -> Vec<Vec<T>> {
    if batch_size == 0 {
        return vec![items.to_vec()];
    }
    items.chunks(batch_size).map(<[T]>::to_vec).collect()
}
