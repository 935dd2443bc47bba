//! Converts between `Concept` and `lilac-db`'s storage-agnostic
//! `ConceptRecord`/`ExampleRecord`, and offers save/load against a
//! `LilacDb` (spec.md §4.H "Persistence of concepts/drafts/versions uses
//! `lilac-db`"). A fitted `ConceptModel`'s logistic weights aren't
//! persisted — they're cheap to recompute from the labeled examples via
//! `sync()` after a reload.

use lilac_db::{ConceptRecord, ExampleRecord, LilacDb};
use lilac_signals::InputType;

use crate::concept::{Concept, Example, ExampleIn, ExampleOrigin};
use crate::error::ConceptError;

fn input_type_to_string(input_type: InputType) -> String {
    match input_type {
        InputType::Text => "text".to_string(),
        InputType::TextEmbedding => "text_embedding".to_string(),
    }
}

fn string_to_input_type(s: &str) -> Result<InputType, ConceptError> {
    match s {
        "text" => Ok(InputType::Text),
        "text_embedding" => Ok(InputType::TextEmbedding),
        other => Err(ConceptError::Persistence(format!("unrecognized input_type '{other}'"))),
    }
}

fn example_to_record(example: &Example) -> ExampleRecord {
    let (origin_namespace, origin_dataset, origin_row_id) = match &example.input.origin {
        Some(origin) => (Some(origin.dataset_namespace.clone()), Some(origin.dataset_name.clone()), Some(origin.dataset_row_id.clone())),
        None => (None, None, None),
    };
    ExampleRecord {
        example_id: example.id.clone(),
        label: example.input.label,
        text: example.input.text.clone(),
        origin_namespace,
        origin_dataset,
        origin_row_id,
        draft: example.input.draft.clone(),
    }
}

fn record_to_example(record: ExampleRecord) -> Example {
    let origin = match (record.origin_namespace, record.origin_dataset, record.origin_row_id) {
        (Some(dataset_namespace), Some(dataset_name), Some(dataset_row_id)) => Some(ExampleOrigin { dataset_namespace, dataset_name, dataset_row_id }),
        _ => None,
    };
    Example {
        id: record.example_id,
        input: ExampleIn { label: record.label, text: record.text, origin, draft: record.draft },
    }
}

impl Concept {
    /// Upserts this concept's header and its full example set against
    /// `db`.
    ///
    /// # Errors
    ///
    /// Returns `ConceptError` if the write fails.
    pub async fn save(&self, db: &LilacDb) -> Result<(), ConceptError> {
        let record = ConceptRecord {
            namespace: self.namespace.clone(),
            concept_name: self.concept_name.clone(),
            input_type: input_type_to_string(self.input_type),
            version: self.version,
            description: self.description.clone(),
        };
        let examples: Vec<ExampleRecord> = self.data.values().map(example_to_record).collect();
        db.save_concept(&record, &examples).await.map_err(|e| ConceptError::Persistence(e.to_string()))
    }

    /// Loads a concept previously saved under `(namespace, concept_name)`,
    /// if present.
    ///
    /// # Errors
    ///
    /// Returns `ConceptError` if the read fails or a stored row carries an
    /// unrecognized `input_type`.
    pub async fn load(db: &LilacDb, namespace: &str, concept_name: &str) -> Result<Option<Self>, ConceptError> {
        let loaded = db.load_concept(namespace, concept_name).await.map_err(|e| ConceptError::Persistence(e.to_string()))?;
        let Some((record, example_records)) = loaded else {
            return Ok(None);
        };

        let mut concept = Self::new(record.namespace, record.concept_name, string_to_input_type(&record.input_type)?);
        concept.version = record.version;
        concept.description = record.description;
        for example_record in example_records {
            let example = record_to_example(example_record);
            concept.data.insert(example.id.clone(), example);
        }
        Ok(Some(concept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::ExampleIn;

    #[tokio::test]
    async fn round_trips_a_concept_through_lilac_db() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        let mut concept = Concept::new("local", "toxicity", InputType::Text);
        concept.add_example(
            "0",
            ExampleIn {
                label: true,
                text: Some("hello".into()),
                origin: Some(ExampleOrigin {
                    dataset_namespace: "ns".into(),
                    dataset_name: "ds".into(),
                    dataset_row_id: "r0".into(),
                }),
                draft: None,
            },
        );
        concept.add_example(
            "1",
            ExampleIn {
                label: false,
                text: Some("world".into()),
                origin: None,
                draft: Some("d1".into()),
            },
        );

        concept.save(&db).await.unwrap();
        let loaded = Concept::load(&db, "local", "toxicity").await.unwrap().unwrap();

        assert_eq!(loaded.version, concept.version);
        assert_eq!(loaded.data.len(), 2);
        let origin = loaded.data["0"].input.origin.clone().unwrap();
        assert_eq!(origin.dataset_row_id, "r0");
        assert_eq!(loaded.data["1"].input.draft.as_deref(), Some("d1"));
    }

    #[tokio::test]
    async fn missing_concept_loads_as_none() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        assert!(Concept::load(&db, "local", "missing").await.unwrap().is_none());
    }
}
