//! Concept/example record persistence (spec.md §4.H, §6 "`lilac-db`...
//! used only by... `lilac-concepts`"). `ConceptRecord`/`ExampleRecord`
//! mirror `lilac-concepts::Concept`/`Example` without depending on that
//! crate; a fitted `ConceptModel`'s logistic weights aren't persisted here
//! — they're cheap to recompute from the labeled examples via `sync()`
//! after a reload.

use libsql::params;

use crate::error::DatabaseError;
use crate::helpers::get_opt_string;
use crate::LilacDb;

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptRecord {
    pub namespace: String,
    pub concept_name: String,
    pub input_type: String,
    pub version: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExampleRecord {
    pub example_id: String,
    pub label: bool,
    pub text: Option<String>,
    pub origin_namespace: Option<String>,
    pub origin_dataset: Option<String>,
    pub origin_row_id: Option<String>,
    /// `None` means "main".
    pub draft: Option<String>,
}

impl LilacDb {
    /// Upserts a concept's header row and replaces its full example set in
    /// one transaction (examples are cheap to resend wholesale; a concept's
    /// labeled set is rarely more than a few thousand rows).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on a SQL failure.
    pub async fn save_concept(&self, concept: &ConceptRecord, examples: &[ExampleRecord]) -> Result<(), DatabaseError> {
        let tx = self.conn().transaction().await?;
        tx.execute(
            "INSERT INTO concepts (namespace, concept_name, input_type, version, description)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(namespace, concept_name) DO UPDATE SET
               input_type = excluded.input_type,
               version = excluded.version,
               description = excluded.description",
            params![
                concept.namespace.clone(),
                concept.concept_name.clone(),
                concept.input_type.clone(),
                concept.version,
                concept.description.clone(),
            ],
        )
        .await?;

        tx.execute("DELETE FROM concept_examples WHERE concept_namespace = ?1 AND concept_name = ?2", params![concept.namespace.clone(), concept.concept_name.clone()]).await?;

        for example in examples {
            tx.execute(
                "INSERT INTO concept_examples
                   (concept_namespace, concept_name, example_id, label, text, origin_namespace, origin_dataset, origin_row_id, draft)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    concept.namespace.clone(),
                    concept.concept_name.clone(),
                    example.example_id.clone(),
                    i64::from(example.label),
                    example.text.clone(),
                    example.origin_namespace.clone(),
                    example.origin_dataset.clone(),
                    example.origin_row_id.clone(),
                    example.draft.clone(),
                ],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Loads a concept's header and its full example set, if present.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on a SQL failure or a malformed stored row.
    pub async fn load_concept(&self, namespace: &str, concept_name: &str) -> Result<Option<(ConceptRecord, Vec<ExampleRecord>)>, DatabaseError> {
        let mut header_rows = self
            .conn()
            .query(
                "SELECT namespace, concept_name, input_type, version, description FROM concepts WHERE namespace = ?1 AND concept_name = ?2",
                params![namespace.to_string(), concept_name.to_string()],
            )
            .await?;
        let Some(header_row) = header_rows.next().await? else {
            return Ok(None);
        };
        let concept = ConceptRecord {
            namespace: header_row.get(0)?,
            concept_name: header_row.get(1)?,
            input_type: header_row.get(2)?,
            version: header_row.get(3)?,
            description: get_opt_string(&header_row, 4)?,
        };

        let mut example_rows = self
            .conn()
            .query(
                "SELECT example_id, label, text, origin_namespace, origin_dataset, origin_row_id, draft
                 FROM concept_examples WHERE concept_namespace = ?1 AND concept_name = ?2",
                params![namespace.to_string(), concept_name.to_string()],
            )
            .await?;
        let mut examples = Vec::new();
        while let Some(row) = example_rows.next().await? {
            let label: i64 = row.get(1)?;
            examples.push(ExampleRecord {
                example_id: row.get(0)?,
                label: label != 0,
                text: get_opt_string(&row, 2)?,
                origin_namespace: get_opt_string(&row, 3)?,
                origin_dataset: get_opt_string(&row, 4)?,
                origin_row_id: get_opt_string(&row, 5)?,
                draft: get_opt_string(&row, 6)?,
            });
        }

        Ok(Some((concept, examples)))
    }

    /// Lists every concept persisted under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on a SQL failure.
    pub async fn list_concepts(&self, namespace: &str) -> Result<Vec<ConceptRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT namespace, concept_name, input_type, version, description FROM concepts WHERE namespace = ?1 ORDER BY concept_name",
                params![namespace.to_string()],
            )
            .await?;
        let mut concepts = Vec::new();
        while let Some(row) = rows.next().await? {
            concepts.push(ConceptRecord {
                namespace: row.get(0)?,
                concept_name: row.get(1)?,
                input_type: row.get(2)?,
                version: row.get(3)?,
                description: get_opt_string(&row, 4)?,
            });
        }
        Ok(concepts)
    }

    /// Deletes a concept and its examples (the `ON DELETE CASCADE` foreign
    /// key handles the latter).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on a SQL failure.
    pub async fn delete_concept(&self, namespace: &str, concept_name: &str) -> Result<(), DatabaseError> {
        self.conn().execute("DELETE FROM concepts WHERE namespace = ?1 AND concept_name = ?2", params![namespace.to_string(), concept_name.to_string()]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_concept() -> (ConceptRecord, Vec<ExampleRecord>) {
        let concept = ConceptRecord {
            namespace: "local".to_string(),
            concept_name: "toxicity".to_string(),
            input_type: "text".to_string(),
            version: 1,
            description: None,
        };
        let examples = vec![
            ExampleRecord {
                example_id: "0".to_string(),
                label: true,
                text: Some("hello".to_string()),
                origin_namespace: None,
                origin_dataset: None,
                origin_row_id: None,
                draft: None,
            },
            ExampleRecord {
                example_id: "1".to_string(),
                label: false,
                text: Some("world".to_string()),
                origin_namespace: Some("ns".to_string()),
                origin_dataset: Some("ds".to_string()),
                origin_row_id: Some("r7".to_string()),
                draft: Some("d1".to_string()),
            },
        ];
        (concept, examples)
    }

    #[tokio::test]
    async fn round_trips_a_concept_and_its_examples() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        let (concept, examples) = sample_concept();
        db.save_concept(&concept, &examples).await.unwrap();

        let (loaded_concept, loaded_examples) = db.load_concept("local", "toxicity").await.unwrap().unwrap();
        assert_eq!(loaded_concept, concept);
        assert_eq!(loaded_examples.len(), 2);
        assert!(loaded_examples.iter().any(|e| e.example_id == "1" && e.draft.as_deref() == Some("d1")));
    }

    #[tokio::test]
    async fn resaving_replaces_the_example_set() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        let (concept, examples) = sample_concept();
        db.save_concept(&concept, &examples).await.unwrap();

        let mut updated = concept.clone();
        updated.version = 2;
        let fewer_examples = vec![examples[0].clone()];
        db.save_concept(&updated, &fewer_examples).await.unwrap();

        let (loaded_concept, loaded_examples) = db.load_concept("local", "toxicity").await.unwrap().unwrap();
        assert_eq!(loaded_concept.version, 2);
        assert_eq!(loaded_examples.len(), 1);
    }

    #[tokio::test]
    async fn missing_concept_is_none() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        assert!(db.load_concept("local", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_concepts_is_scoped_to_namespace() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        let (concept, examples) = sample_concept();
        db.save_concept(&concept, &examples).await.unwrap();

        let mut other_namespace = concept.clone();
        other_namespace.namespace = "other".to_string();
        db.save_concept(&other_namespace, &[]).await.unwrap();

        let local = db.list_concepts("local").await.unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].concept_name, "toxicity");
    }

    #[tokio::test]
    async fn delete_cascades_to_examples() {
        let db = LilacDb::open_local(":memory:").await.unwrap();
        let (concept, examples) = sample_concept();
        db.save_concept(&concept, &examples).await.unwrap();

        db.delete_concept("local", "toxicity").await.unwrap();
        assert!(db.load_concept("local", "toxicity").await.unwrap().is_none());
    }
}
