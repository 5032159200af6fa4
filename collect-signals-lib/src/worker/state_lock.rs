use crate::Result;
use fs4::fs_std::FileExt;
use ohno::IntoAppError;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "checkpoint";

/// Holds the single-writer lock on a checkpoint; released on drop.
#[derive(Debug)]
pub struct StateLockGuard(File);

impl Drop for StateLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.unlock() {
            log::warn!(target: LOG_TARGET, "Could not unlock checkpoint: {e:#}");
        }
    }
}

/// Path of the lock file guarding a checkpoint file.
pub fn lock_path(state_path: &Path) -> PathBuf {
    let mut name = state_path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".lock");
    state_path.with_file_name(name)
}

/// Take the exclusive advisory lock for a checkpoint file, waiting for any other holder.
pub async fn acquire_state_lock(state_path: &Path) -> Result<StateLockGuard> {
    let lock_path = lock_path(state_path);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .into_app_err_with(|| format!("opening checkpoint lock file at '{}'", lock_path.display()))?;

    let file = tokio::task::spawn_blocking(move || {
        file.lock_exclusive()
            .into_app_err_with(|| format!("acquiring exclusive lock on checkpoint at '{}'", lock_path.display()))?;
        log::debug!(target: LOG_TARGET, "Acquired checkpoint lock at '{}'", lock_path.display());
        Ok::<_, ohno::AppError>(file)
    })
    .await
    .into_app_err("lock task panicked")??;

    Ok(StateLockGuard(file))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path() {
        assert_eq!(lock_path(Path::new("/tmp/job/state.json")), Path::new("/tmp/job/state.json.lock"));
    }

    #[tokio::test]
    async fn test_acquire_creates_lock_file_and_releases_on_drop() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let state_path = temp_dir.path().join("state.json");

        let guard = acquire_state_lock(&state_path).await.unwrap();
        assert!(lock_path(&state_path).exists());
        drop(guard);

        let again = acquire_state_lock(&state_path).await;
        let _ = again.unwrap();
    }

    #[tokio::test]
    async fn test_acquire_in_missing_directory_fails() {
        let path = Path::new("this_directory_does_not_exist_at_all_424242/state.json");
        let _ = acquire_state_lock(path).await.unwrap_err();
    }
}
