//! Checkpointed progress for long-running imports.
//!
//! One JSON file per source records which discovery-stub IDs have been
//! completed or failed. Every mark is written through to disk
//! immediately, so a kill at any point loses at most the in-flight item.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::DiscoveryStub;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted run-progress state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_updated: Option<DateTime<Utc>>,
    pub total_discovered: usize,
    #[serde(default)]
    pub completed_ids: BTreeSet<String>,
    #[serde(default)]
    pub failed_ids: BTreeSet<String>,
}

/// Checkpoint file with write-through marking.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    state: Checkpoint,
}

impl CheckpointStore {
    /// Load an existing checkpoint, or start fresh if the file is absent.
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let state = if path.exists() {
            let data = fs::read_to_string(path)?;
            let state: Checkpoint = serde_json::from_str(&data)?;
            info!(
                "Loaded checkpoint: {} completed, {} failed",
                state.completed_ids.len(),
                state.failed_ids.len()
            );
            state
        } else {
            Checkpoint::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    /// Start a fresh checkpoint regardless of what is on disk.
    pub fn fresh(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            state: Checkpoint::default(),
        }
    }

    pub fn set_total_discovered(&mut self, total: usize) -> Result<(), CheckpointError> {
        self.state.total_discovered = total;
        self.save()
    }

    /// Mark an item done. A previously failed item that now succeeds is
    /// removed from the failed set; failures are not sticky.
    pub fn mark_completed(&mut self, id: &str) -> Result<(), CheckpointError> {
        self.state.completed_ids.insert(id.to_string());
        self.state.failed_ids.remove(id);
        self.save()
    }

    pub fn mark_failed(&mut self, id: &str) -> Result<(), CheckpointError> {
        self.state.failed_ids.insert(id.to_string());
        self.save()
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.state.completed_ids.contains(id)
    }

    pub fn completed_count(&self) -> usize {
        self.state.completed_ids.len()
    }

    pub fn failed_count(&self) -> usize {
        self.state.failed_ids.len()
    }

    pub fn state(&self) -> &Checkpoint {
        &self.state
    }

    /// Drop stubs already completed in a previous run.
    pub fn filter_pending(&self, stubs: Vec<DiscoveryStub>) -> Vec<DiscoveryStub> {
        stubs
            .into_iter()
            .filter(|stub| !self.is_completed(&stub.id))
            .collect()
    }

    // Write-then-rename so a kill mid-save cannot leave a truncated
    // checkpoint behind.
    fn save(&mut self) -> Result<(), CheckpointError> {
        self.state.last_updated = Some(Utc::now());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
