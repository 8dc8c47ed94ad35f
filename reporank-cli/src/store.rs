//! Batch persistence for completed analysis runs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reporank_core::{AnalysisReport, Constraint, Preference, RepoRankError, Result};

/// A persisted batch: the reports of one orchestration call together with
/// the assessment inputs they were submitted with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Generated batch identifier.
    pub id: String,
    /// Identifier of the user who requested the batch.
    pub owner: String,
    /// When the batch was stored.
    pub created_at: DateTime<Utc>,
    /// Normalized reports, one per surviving repository.
    pub reports: Vec<AnalysisReport>,
    /// Constraints submitted with the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Preferences submitted with the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferences: Vec<Preference>,
}

/// Persistence collaborator: stores one batch per orchestration call.
pub trait BatchStore {
    /// Persist the batch and return its generated identifier.
    fn save_batch(
        &self,
        owner: &str,
        reports: &[AnalysisReport],
        constraints: &[Constraint],
        preferences: &[Preference],
    ) -> Result<String>;
}

/// Stores batches as pretty-printed JSON documents in a directory.
#[derive(Debug, Clone)]
pub struct JsonBatchStore {
    root: PathBuf,
}

impl JsonBatchStore {
    /// Create a store rooted at `root`; the directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the document a batch id maps to.
    pub fn batch_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("batch-{id}.json"))
    }

    /// Load a batch document from an explicit path.
    pub fn load_batch(path: &Path) -> Result<Batch> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            RepoRankError::Validation(format!(
                "could not read batch document {}: {err}",
                path.display()
            ))
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            RepoRankError::Validation(format!(
                "malformed batch document {}: {err}",
                path.display()
            ))
        })
    }
}

impl BatchStore for JsonBatchStore {
    fn save_batch(
        &self,
        owner: &str,
        reports: &[AnalysisReport],
        constraints: &[Constraint],
        preferences: &[Preference],
    ) -> Result<String> {
        std::fs::create_dir_all(&self.root).map_err(|err| {
            RepoRankError::Internal(format!(
                "failed to prepare batch store {}: {err}",
                self.root.display()
            ))
        })?;

        let id = Uuid::new_v4().to_string();
        let batch = Batch {
            id: id.clone(),
            owner: owner.to_string(),
            created_at: Utc::now(),
            reports: reports.to_vec(),
            constraints: constraints.to_vec(),
            preferences: preferences.to_vec(),
        };
        let contents = serde_json::to_string_pretty(&batch)
            .map_err(|err| RepoRankError::Internal(format!("failed to encode batch: {err}")))?;
        std::fs::write(self.batch_path(&id), contents).map_err(|err| {
            RepoRankError::Internal(format!("failed to write batch {id}: {err}"))
        })?;

        Ok(id)
    }
}
