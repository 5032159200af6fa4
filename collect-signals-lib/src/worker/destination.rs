use super::json_doc;
use crate::Result;
use chrono::{DateTime, Utc};
use core::fmt::Debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "      dest";

/// Name of the completion marker written into a job's directory.
pub const METADATA_FILE_NAME: &str = ".shard_metadata";

/// Marker proving that a job run finished, and identifying which run produced which rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMetadata {
    pub shard_count: u32,
    pub job_time: DateTime<Utc>,
}

/// Where shard outputs and completion markers go.
///
/// Writes are create-or-replace and must tolerate being repeated for the same shard.
pub trait Destination: Debug + Send + Sync {
    /// Whether a complete output already exists for the shard.
    fn shard_exists(&self, job_time: DateTime<Utc>, shard: u32) -> Result<bool>;

    /// Store the complete output of a shard.
    fn write_shard(&self, job_time: DateTime<Utc>, shard: u32, contents: &[u8]) -> Result<()>;

    fn write_metadata(&self, metadata: &CompletionMetadata) -> Result<()>;

    fn read_metadata(&self, job_time: DateTime<Utc>) -> Result<Option<CompletionMetadata>>;
}

/// A destination on the local file system.
///
/// Layout: `<root>/<YYYY.MM.DD>/<HHMMSS>/shard-<index>.<extension>` plus the
/// completion marker in the same directory. Shard files are renamed into place
/// only once fully written, so their existence implies completeness.
#[derive(Debug, Clone)]
pub struct FsDestination {
    root: PathBuf,
    extension: &'static str,
}

impl FsDestination {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, extension: &'static str) -> Self {
        Self {
            root: root.into(),
            extension,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything written for one job run.
    #[must_use]
    pub fn job_dir(&self, job_time: DateTime<Utc>) -> PathBuf {
        self.root
            .join(job_time.format("%Y.%m.%d").to_string())
            .join(job_time.format("%H%M%S").to_string())
    }

    #[must_use]
    pub fn shard_path(&self, job_time: DateTime<Utc>, shard: u32) -> PathBuf {
        self.job_dir(job_time).join(format!("shard-{shard:07}.{}", self.extension))
    }

    #[must_use]
    pub fn metadata_path(&self, job_time: DateTime<Utc>) -> PathBuf {
        self.job_dir(job_time).join(METADATA_FILE_NAME)
    }
}

impl Destination for FsDestination {
    fn shard_exists(&self, job_time: DateTime<Utc>, shard: u32) -> Result<bool> {
        let path = self.shard_path(job_time, shard);
        Ok(path.try_exists()?)
    }

    fn write_shard(&self, job_time: DateTime<Utc>, shard: u32, contents: &[u8]) -> Result<()> {
        let path = self.shard_path(job_time, shard);
        json_doc::write_atomic(&path, contents)?;
        log::debug!(target: LOG_TARGET, "Wrote shard {shard} to '{}'", path.display());
        Ok(())
    }

    fn write_metadata(&self, metadata: &CompletionMetadata) -> Result<()> {
        let path = self.metadata_path(metadata.job_time);
        json_doc::save(metadata, &path)?;
        log::debug!(target: LOG_TARGET, "Wrote completion marker to '{}'", path.display());
        Ok(())
    }

    fn read_metadata(&self, job_time: DateTime<Utc>) -> Result<Option<CompletionMetadata>> {
        json_doc::load(self.metadata_path(job_time), "completion marker")
    }
}
