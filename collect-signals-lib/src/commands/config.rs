use crate::Result;
use crate::collector::FailurePolicy;
use crate::scoring::{ScoringConfig, WeightedScorer};
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file picked up from the current directory.
pub const CONFIG_FILE_NAME: &str = "collect_signals.toml";

const MAX_ATTEMPTS_LIMIT: u32 = 100;
const MAX_CONCURRENCY: usize = 256;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Repositories per shard
    #[serde(default = "default_shard_size")]
    pub shard_size: usize,

    /// Attempts per shard before the job fails
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Checkpoint file
    #[serde(default = "default_state_file")]
    pub state_file: Utf8PathBuf,

    /// Root of the primary (CSV) destination
    #[serde(default = "default_output_dir")]
    pub output_dir: Utf8PathBuf,

    /// Root of the raw (JSON lines) destination
    #[serde(default = "default_raw_output_dir")]
    pub raw_output_dir: Utf8PathBuf,

    /// Handling of individual source failures
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Repositories of a shard collected at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_scoring")]
    pub scoring: ScoringConfig,
}

const fn default_shard_size() -> usize {
    1000
}

const fn default_max_attempts() -> u32 {
    crate::worker::DEFAULT_MAX_ATTEMPTS
}

fn default_state_file() -> Utf8PathBuf {
    Utf8PathBuf::from("collect-signals-state.json")
}

fn default_output_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("signals")
}

fn default_raw_output_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("signals-raw")
}

const fn default_concurrency() -> usize {
    1
}

fn default_scoring() -> ScoringConfig {
    Config::default().scoring
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `collect_signals.toml` in `base_dir` is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.to_path_buf(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config
            .validate()
            .map_err(|e| app_err!("invalid configuration file '{final_path}': {e}"))?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or a required setting is empty
    pub fn validate(&self) -> Result<()> {
        if self.shard_size == 0 {
            return Err(app_err!("shard_size must be greater than 0"));
        }

        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.max_attempts) {
            return Err(app_err!(
                "max_attempts must be between 1 and {MAX_ATTEMPTS_LIMIT}, got {}",
                self.max_attempts
            ));
        }

        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(app_err!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            ));
        }

        for (name, path) in [
            ("state_file", &self.state_file),
            ("output_dir", &self.output_dir),
            ("raw_output_dir", &self.raw_output_dir),
        ] {
            if path.as_str().trim().is_empty() {
                return Err(app_err!("{name} must not be empty"));
            }
        }

        if self.output_dir == self.raw_output_dir {
            return Err(app_err!("output_dir and raw_output_dir must differ, both are '{}'", self.output_dir));
        }

        if self.scoring.enabled {
            let _ = WeightedScorer::from_config(&self.scoring)?;
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.shard_size, 1000);
        assert_eq!(config.max_attempts, 7);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.scoring.column_name(), "default_score");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = Utf8Path::from_path(temp_dir.path()).unwrap();
        let config = Config::load(base, None).unwrap();
        assert_eq!(config.state_file, Utf8PathBuf::from("collect-signals-state.json"));
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = Utf8Path::from_path(temp_dir.path()).unwrap();
        fs::write(base.join(CONFIG_FILE_NAME), "shard_size = 3\nfailure_policy = \"lenient\"\n").unwrap();

        let config = Config::load(base, None).unwrap();
        assert_eq!(config.shard_size, 3);
        assert_eq!(config.failure_policy, FailurePolicy::Lenient);
        assert_eq!(config.scoring, Config::default().scoring);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp_dir.path().join("custom.toml")).unwrap();
        fs::write(&path, "shard_sise = 3\n").unwrap();

        let err = Config::load(Utf8Path::new("."), Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("parsing configuration file"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let _ = Config::load(Utf8Path::new("."), Some(Utf8Path::new("does-not-exist-424242.toml"))).unwrap_err();
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = Config::default();
        config.shard_size = 0;
        let _ = config.validate().unwrap_err();

        let mut config = Config::default();
        config.max_attempts = 0;
        let _ = config.validate().unwrap_err();
        config.max_attempts = 101;
        let _ = config.validate().unwrap_err();

        let mut config = Config::default();
        config.concurrency = 0;
        let _ = config.validate().unwrap_err();

        let mut config = Config::default();
        config.state_file = Utf8PathBuf::from("  ");
        let _ = config.validate().unwrap_err();

        let mut config = Config::default();
        config.raw_output_dir = config.output_dir.clone();
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_invalid_scoring_only_matters_when_enabled() {
        let mut config = Config::default();
        config.scoring.inputs.clear();
        let _ = config.validate().unwrap_err();

        config.scoring.enabled = false;
        config.validate().unwrap();
    }
}
