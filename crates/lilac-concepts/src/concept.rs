//! `Concept`: a labeled collection of examples, grouped into named drafts
//! (spec.md §4.H "Drafts: multiple labeled variants live under named draft
//! IDs; `main` is the deployed view").
//!
//! Grounded on `examples/original_source/src/concepts/concept.py`'s
//! `Concept`/`Example`/`ExampleIn`/`draft_examples`/`Concept.drafts`.

use std::collections::{BTreeMap, HashMap, HashSet};

use lilac_signals::InputType;
use serde::{Deserialize, Serialize};

use crate::error::ConceptError;

pub const DRAFT_MAIN: &str = "main";

/// Where a labeled example came from, for traceability back to the source
/// dataset row it was pulled from (spec.md §4.H doesn't require this, but
/// the reference implementation's `ExampleOrigin` is cheap to keep and the
/// concept editor UI needs it to jump back to the row a label came from).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleOrigin {
    pub dataset_namespace: String,
    pub dataset_name: String,
    pub dataset_row_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleIn {
    pub label: bool,
    pub text: Option<String>,
    pub origin: Option<ExampleOrigin>,
    /// `None` means "main".
    pub draft: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub id: String,
    #[serde(flatten)]
    pub input: ExampleIn,
}

impl Example {
    #[must_use]
    pub fn draft(&self) -> &str {
        self.input.draft.as_deref().unwrap_or(DRAFT_MAIN)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub namespace: String,
    pub concept_name: String,
    pub input_type: InputType,
    pub data: HashMap<String, Example>,
    pub version: i64,
    pub description: Option<String>,
}

impl Concept {
    #[must_use]
    pub fn new(namespace: impl Into<String>, concept_name: impl Into<String>, input_type: InputType) -> Self {
        Self {
            namespace: namespace.into(),
            concept_name: concept_name.into(),
            input_type,
            data: HashMap::new(),
            version: 0,
            description: None,
        }
    }

    pub fn add_example(&mut self, id: impl Into<String>, input: ExampleIn) {
        let id = id.into();
        self.data.insert(id.clone(), Example { id, input });
        self.version += 1;
    }

    /// Every draft name present in the concept's data, plus `main` always
    /// (spec.md §4.H, `Concept.drafts`).
    #[must_use]
    pub fn drafts(&self) -> Vec<String> {
        let mut drafts: HashSet<String> = self.data.values().map(|e| e.draft().to_string()).collect();
        drafts.insert(DRAFT_MAIN.to_string());
        let mut sorted: Vec<String> = drafts.into_iter().collect();
        sorted.sort();
        sorted
    }

    /// Examples visible in `draft`: the draft's own examples, overlaid on
    /// `main`'s examples whose text doesn't already appear in the draft
    /// (spec.md §6 scenario 6 — dedup by text when viewing a draft).
    ///
    /// # Errors
    ///
    /// Returns `ConceptError::UnknownDraft` for any name other than `main`
    /// that never appears on an example.
    pub fn draft_examples(&self, draft: &str) -> Result<BTreeMap<String, Example>, ConceptError> {
        let mut by_draft: HashMap<&str, BTreeMap<String, Example>> = HashMap::new();
        for example in self.data.values() {
            by_draft.entry(example.draft()).or_default().insert(example.id.clone(), example.clone());
        }

        if draft == DRAFT_MAIN {
            return Ok(by_draft.remove(DRAFT_MAIN).unwrap_or_default());
        }
        if !by_draft.contains_key(draft) {
            return Err(ConceptError::UnknownDraft(draft.to_string()));
        }

        let mut draft_set = by_draft.remove(draft).unwrap_or_default();
        let draft_texts: HashSet<&Option<String>> = draft_set.values().map(|e| &e.input.text).collect();
        if let Some(main) = by_draft.get(DRAFT_MAIN) {
            for example in main.values() {
                if !draft_texts.contains(&example.input.text) {
                    draft_set.insert(example.id.clone(), example.clone());
                }
            }
        }
        Ok(draft_set)
    }

    /// Promotes `draft`'s dedup'd view of examples into `main`, clearing
    /// each promoted example's `draft` marker, and bumps the concept
    /// version (spec.md §6 scenario 6).
    ///
    /// # Errors
    ///
    /// See [`Self::draft_examples`].
    pub fn merge_draft(&mut self, draft: &str) -> Result<(), ConceptError> {
        let merged = self.draft_examples(draft)?;

        self.data.retain(|_, example| example.draft() != draft && example.draft() != DRAFT_MAIN);
        for (id, mut example) in merged {
            example.input.draft = None;
            self.data.insert(id, example);
        }
        self.version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept_with_draft() -> Concept {
        let mut concept = Concept::new("local", "toxicity", InputType::Text);
        concept.add_example(
            "0",
            ExampleIn {
                label: true,
                text: Some("hello".into()),
                origin: None,
                draft: None,
            },
        );
        concept.add_example(
            "1",
            ExampleIn {
                label: false,
                text: Some("world".into()),
                origin: None,
                draft: None,
            },
        );
        concept.add_example(
            "2",
            ExampleIn {
                label: true,
                text: Some("hello d1".into()),
                origin: None,
                draft: Some("d1".into()),
            },
        );
        concept
    }

    #[test]
    fn draft_examples_overlays_main_with_draft() {
        let concept = concept_with_draft();
        let draft = concept.draft_examples("d1").unwrap();
        let ids: HashSet<&String> = draft.keys().collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&"0".to_string()));
        assert!(ids.contains(&"1".to_string()));
        assert!(ids.contains(&"2".to_string()));
    }

    #[test]
    fn merge_draft_clears_marker_and_bumps_version() {
        let mut concept = concept_with_draft();
        let version_before = concept.version;
        concept.merge_draft("d1").unwrap();

        assert_eq!(concept.data.len(), 3);
        assert!(concept.data.values().all(|e| e.input.draft.is_none()));
        assert_eq!(concept.version, version_before + 1);
    }

    #[test]
    fn unknown_draft_errors() {
        let concept = concept_with_draft();
        assert!(matches!(concept.draft_examples("missing"), Err(ConceptError::UnknownDraft(_))));
    }
}
