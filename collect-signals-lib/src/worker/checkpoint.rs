use super::json_doc;
use super::state_lock::{StateLockGuard, acquire_state_lock};
use crate::Result;
use chrono::{DateTime, Utc};
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Durable progress of one job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Index of the first shard that has not completed yet.
    pub shard: u32,

    /// Attempts already taken on `shard`, including one that may have crashed mid-way.
    pub attempt: u32,

    /// Fixed when the job starts and carried by every request of the run.
    pub job_time: DateTime<Utc>,
}

impl Checkpoint {
    #[must_use]
    pub const fn new(job_time: DateTime<Utc>) -> Self {
        Self {
            shard: 0,
            attempt: 0,
            job_time,
        }
    }
}

/// Single-writer store for the checkpoint file.
///
/// Opening the store takes an exclusive lock next to the checkpoint file, so two
/// processes can never drive the same job at once.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    _lock: StateLockGuard,
}

impl CheckpointStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create checkpoint directory '{}'", parent.display()))?;
        }

        let lock = acquire_state_lock(&path).await?;
        Ok(Self { path, _lock: lock })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted checkpoint, if any.
    pub fn load(&self) -> Result<Option<Checkpoint>> {
        json_doc::load(&self.path, "checkpoint")
    }

    /// Load the persisted checkpoint or start a fresh one at `job_time`.
    pub fn load_or_default(&self, job_time: DateTime<Utc>) -> Result<Checkpoint> {
        Ok(self.load()?.unwrap_or_else(|| Checkpoint::new(job_time)))
    }

    /// Persist the checkpoint atomically.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        json_doc::save(checkpoint, &self.path)
    }

    /// Delete the checkpoint. Clearing an absent checkpoint succeeds.
    pub fn clear(&self) -> Result<()> {
        json_doc::remove(&self.path)
    }
}
