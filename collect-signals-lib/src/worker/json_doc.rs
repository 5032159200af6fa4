//! Small JSON documents on disk: checkpoints and completion markers.

use crate::Result;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "  json_doc";

/// Load a document, returning `None` when the file does not exist.
pub fn load<T>(path: impl AsRef<Path>, context: impl AsRef<str>) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let path = path.as_ref();
    let ctx = context.as_ref();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!(target: LOG_TARGET, "No {ctx} at '{}'", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e).into_app_err_with(|| format!("unable to open {ctx} '{}'", path.display())),
    };

    let data = serde_json::from_reader(BufReader::new(file)).into_app_err_with(|| format!("unable to parse {ctx} '{}'", path.display()))?;

    log::debug!(target: LOG_TARGET, "Loaded {ctx} from '{}'", path.display());
    Ok(Some(data))
}

/// Save a document atomically.
///
/// The document is written and synced to a sibling temporary file which is then
/// renamed over the destination, so readers see either the old or the new document.
pub fn save<T>(data: &T, path: impl AsRef<Path>) -> Result<()>
where
    T: Serialize,
{
    let path = path.as_ref();
    let bytes = serde_json::to_vec_pretty(data).into_app_err_with(|| format!("unable to serialize '{}'", path.display()))?;
    write_atomic(path, &bytes)
}

/// Write bytes to `path` atomically, creating parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create directory '{}'", parent.display()))?;
    }

    let tmp_path = temp_path(path);
    {
        let file = File::create(&tmp_path).into_app_err_with(|| format!("unable to create '{}'", tmp_path.display()))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(bytes)
            .into_app_err_with(|| format!("unable to write '{}'", tmp_path.display()))?;
        let file = writer
            .into_inner()
            .map_err(io::IntoInnerError::into_error)
            .into_app_err_with(|| format!("unable to flush '{}'", tmp_path.display()))?;
        file.sync_all().into_app_err_with(|| format!("unable to sync '{}'", tmp_path.display()))?;
    }

    fs::rename(&tmp_path, path).into_app_err_with(|| format!("unable to move '{}' into place", path.display()))?;
    sync_parent(path)
}

/// Flush the directory entry of `path` so a completed rename survives power loss.
#[cfg(unix)]
fn sync_parent(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    File::open(parent)
        .and_then(|dir| dir.sync_all())
        .into_app_err_with(|| format!("unable to sync directory '{}'", parent.display()))
}

#[cfg(not(unix))]
#[expect(clippy::unnecessary_wraps, reason = "matches the unix signature")]
fn sync_parent(_path: &Path) -> Result<()> {
    Ok(())
}

/// Remove a document. A missing file is not an error.
pub fn remove(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).into_app_err_with(|| format!("unable to remove '{}'", path.display())),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: u64,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("state.json");

        let original = TestData {
            name: "test".to_string(),
            value: 42,
        };
        save(&original, &file_path).unwrap();

        let loaded: Option<TestData> = load(&file_path, "test data").unwrap();
        assert_eq!(loaded, Some(original));
        assert!(!temp_path(&file_path).exists());
    }

    #[test]
    fn test_load_missing_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let loaded: Option<TestData> = load(temp_dir.path().join("missing.json"), "test data").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("invalid.json");
        fs::write(&file_path, "not valid json").unwrap();

        let result: Result<Option<TestData>> = load(&file_path, "test data");
        assert!(result.unwrap_err().to_string().contains("unable to parse"));
    }

    #[test]
    fn test_save_creates_parent_directories_and_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b").join("data.json");

        save(&TestData { name: "first".into(), value: 1 }, &nested).unwrap();
        save(&TestData { name: "second".into(), value: 2 }, &nested).unwrap();

        let loaded: TestData = load(&nested, "nested").unwrap().unwrap();
        assert_eq!(loaded.name, "second");
    }

    #[cfg(unix)]
    #[test]
    fn test_sync_parent() {
        let temp_dir = tempfile::tempdir().unwrap();
        sync_parent(&temp_dir.path().join("state.json")).unwrap();

        let err = sync_parent(&temp_dir.path().join("missing").join("state.json")).unwrap_err();
        assert!(err.to_string().contains("unable to sync directory"), "{err}");
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let temp_dir = tempfile::tempdir().unwrap();
        remove(temp_dir.path().join("missing.json")).unwrap();
    }
}
