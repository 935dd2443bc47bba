//! Dataset manifest: the merged schema, source descriptor, and per-shard
//! metadata for one dataset directory (spec.md §6 "Dataset manifest").

use std::path::Path as FsPath;

use lilac_core::Field;
use serde::{Deserialize, Serialize};

use crate::error::LakeError;

/// Where a dataset's rows originally came from. The core only requires a
/// name and the schema the source declared; the reader itself is an
/// external collaborator (spec.md §6 "Source collaborator contract").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub config: serde_json::Value,
}

/// Per-shard metadata tracked in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardMeta {
    /// Filename relative to the dataset directory.
    pub filename: String,
    pub row_count: usize,
    /// False until the shard's write has flushed; uncommitted shards are
    /// filtered from reads (spec.md §9 "incomplete shards").
    pub committed: bool,
}

/// Optional per-row image metadata table, kept as an opaque JSON value
/// (core only threads it through; it does not interpret the contents).
pub type ImageInfo = serde_json::Value;

/// One dataset's manifest: schema, source, and shard list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub schema: Field,
    pub source: SourceDescriptor,
    pub shards: Vec<ShardMeta>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_info: Option<ImageInfo>,
}

impl Manifest {
    #[must_use]
    pub fn new(schema: Field, source: SourceDescriptor) -> Self {
        Self {
            schema,
            source,
            shards: Vec::new(),
            image_info: None,
        }
    }

    /// Shards that have finished flushing, in manifest order.
    pub fn committed_shards(&self) -> impl Iterator<Item = &ShardMeta> {
        self.shards.iter().filter(|s| s.committed)
    }

    pub fn total_rows(&self) -> usize {
        self.committed_shards().map(|s| s.row_count).sum()
    }

    /// Load a manifest from `dataset.json` in `dir`.
    ///
    /// # Errors
    ///
    /// Returns `LakeError::ManifestMissing` if the file cannot be read, or
    /// `LakeError::Serde` if it is not valid JSON for this type.
    pub fn load(dir: &FsPath) -> Result<Self, LakeError> {
        let path = dir.join("dataset.json");
        let bytes = std::fs::read(&path)
            .map_err(|_| LakeError::ManifestMissing(path.display().to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Persist the manifest atomically: write to a temp file, then rename
    /// over `dataset.json` (spec.md §5 "manifest is updated atomically").
    ///
    /// # Errors
    ///
    /// Returns `LakeError::Io` if the write or rename fails, or
    /// `LakeError::Serde` if serialization fails.
    pub fn save(&self, dir: &FsPath) -> Result<(), LakeError> {
        std::fs::create_dir_all(dir)?;
        let final_path = dir.join("dataset.json");
        let tmp_path = dir.join("dataset.json.tmp");
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(&tmp_path, bytes)?;
        std::fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_core::DType;

    #[test]
    fn manifest_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::new(
            Field::leaf(DType::String),
            SourceDescriptor {
                name: "csv".into(),
                config: serde_json::json!({"path": "in.csv"}),
            },
        );
        manifest.save(dir.path()).unwrap();
        let loaded = Manifest::load(dir.path()).unwrap();
        assert_eq!(loaded.source.name, "csv");
        assert_eq!(loaded.total_rows(), 0);
    }

    #[test]
    fn total_rows_excludes_uncommitted_shards() {
        let mut manifest = Manifest::new(
            Field::leaf(DType::String),
            SourceDescriptor {
                name: "csv".into(),
                config: serde_json::json!({}),
            },
        );
        manifest.shards.push(ShardMeta {
            filename: "shard-0.parquet".into(),
            row_count: 10,
            committed: true,
        });
        manifest.shards.push(ShardMeta {
            filename: "shard-1.parquet".into(),
            row_count: 5,
            committed: false,
        });
        assert_eq!(manifest.total_rows(), 10);
    }
}
