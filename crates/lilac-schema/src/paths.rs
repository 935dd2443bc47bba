//! Path membership and leaf enumeration over a `Field` tree (spec.md §4.A).

use lilac_core::{Field, Path, PathComponent};

/// Whether `schema` has a field reachable by `path`. A `Wildcard` component
/// matches a `repeated_field` at that position; any other component matches
/// a struct field by name.
#[must_use]
pub fn contains_path(schema: &Field, path: &Path) -> bool {
    resolve(schema, path.as_slice()).is_some()
}

fn resolve<'a>(field: &'a Field, components: &[PathComponent]) -> Option<&'a Field> {
    let Some((head, rest)) = components.split_first() else {
        return Some(field);
    };
    match head {
        PathComponent::Wildcard => resolve(field.repeated_field.as_deref()?, rest),
        PathComponent::Name(name) => resolve(field.fields.as_ref()?.get(name)?, rest),
        PathComponent::Index(_) => resolve(field.repeated_field.as_deref()?, rest),
    }
}

/// Every leaf path in `schema`, depth-first, struct fields in map order and
/// repeated fields represented with a trailing `Wildcard` component.
#[must_use]
pub fn leaves(schema: &Field) -> Vec<Path> {
    let mut out = Vec::new();
    collect_leaves(schema, &mut Vec::new(), &mut out);
    out
}

fn collect_leaves(field: &Field, prefix: &mut Vec<PathComponent>, out: &mut Vec<Path>) {
    if let Some(fields) = &field.fields {
        for (name, child) in fields {
            prefix.push(PathComponent::Name(name.clone()));
            collect_leaves(child, prefix, out);
            prefix.pop();
        }
    } else if let Some(inner) = &field.repeated_field {
        prefix.push(PathComponent::Wildcard);
        collect_leaves(inner, prefix, out);
        prefix.pop();
    } else {
        out.push(Path::new(prefix.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::{normalize_path, DType};

    fn sample_schema() -> Field {
        Field::struct_(
            [
                ("text".to_string(), Field::leaf(DType::String)),
                (
                    "tags".to_string(),
                    Field::repeated(Field::leaf(DType::String)),
                ),
                (
                    "meta".to_string(),
                    Field::struct_(
                        [("score".to_string(), Field::leaf(DType::Float32))]
                            .into_iter()
                            .collect(),
                    ),
                ),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn contains_path_finds_nested_leaf() {
        let schema = sample_schema();
        assert!(contains_path(&schema, &normalize_path("meta.score")));
        assert!(contains_path(&schema, &normalize_path("tags.*")));
        assert!(!contains_path(&schema, &normalize_path("meta.missing")));
    }

    #[test]
    fn leaves_enumerates_every_terminal_path() {
        let schema = sample_schema();
        let paths: Vec<String> = leaves(&schema).iter().map(ToString::to_string).collect();
        assert!(paths.contains(&"text".to_string()));
        assert!(paths.contains(&"tags.*".to_string()));
        assert!(paths.contains(&"meta.score".to_string()));
        assert_eq!(paths.len(), 3);
    }
}
