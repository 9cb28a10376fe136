//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{CheckupError, Result};

/// Full checkup configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub scan: ScanConfig,
    pub logging: LoggingConfig,
}

/// Filesystem locations of the record store and the logs.
///
/// Relative paths resolve against the working directory of the run, so by
/// default every monitored tree keeps its store next to where checkup is run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub store_db: PathBuf,
    pub report_log: PathBuf,
    pub activity_log: PathBuf,
}

/// Walk and reconciliation behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanConfig {
    /// Descend into symlinked directories.
    pub follow_symlinks: bool,
    /// Resolve the scan root to an absolute, symlink-free path before walking,
    /// so the same tree always produces the same record keys.
    pub canonicalize_paths: bool,
    /// Abort the whole run on the first unreadable file instead of reporting it.
    pub abort_on_read_error: bool,
    /// Maximum directory depth below the root (0 = root only).
    pub max_depth: usize,
}

/// Structured activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub activity_log_enabled: bool,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[CHK-CONFIG] WARNING: HOME not set, falling back to /tmp for config path"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("checkup").join("config.toml"),
            store_db: PathBuf::from("checkup.db"),
            report_log: PathBuf::from("checkup.log"),
            activity_log: PathBuf::from("checkup-activity.jsonl"),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            canonicalize_paths: false,
            abort_on_read_error: false,
            max_depth: usize::MAX,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            activity_log_enabled: true,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| CheckupError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(CheckupError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes and releases.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CHECKUP_STORE_DB") {
            self.paths.store_db = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CHECKUP_REPORT_LOG") {
            self.paths.report_log = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CHECKUP_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }

        if let Some(raw) = lookup("CHECKUP_SCAN_FOLLOW_SYMLINKS") {
            self.scan.follow_symlinks = parse_env_bool("CHECKUP_SCAN_FOLLOW_SYMLINKS", &raw)?;
        }
        if let Some(raw) = lookup("CHECKUP_SCAN_CANONICALIZE_PATHS") {
            self.scan.canonicalize_paths =
                parse_env_bool("CHECKUP_SCAN_CANONICALIZE_PATHS", &raw)?;
        }
        if let Some(raw) = lookup("CHECKUP_SCAN_ABORT_ON_READ_ERROR") {
            self.scan.abort_on_read_error =
                parse_env_bool("CHECKUP_SCAN_ABORT_ON_READ_ERROR", &raw)?;
        }
        if let Some(raw) = lookup("CHECKUP_SCAN_MAX_DEPTH") {
            self.scan.max_depth = parse_env_usize("CHECKUP_SCAN_MAX_DEPTH", &raw)?;
        }

        if let Some(raw) = lookup("CHECKUP_LOGGING_ACTIVITY_LOG_ENABLED") {
            self.logging.activity_log_enabled =
                parse_env_bool("CHECKUP_LOGGING_ACTIVITY_LOG_ENABLED", &raw)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("paths.store_db", &self.paths.store_db),
            ("paths.report_log", &self.paths.report_log),
        ] {
            if path.as_os_str().is_empty() {
                return Err(CheckupError::InvalidConfig {
                    details: format!("{name} must not be empty"),
                });
            }
        }

        if self.paths.store_db == self.paths.report_log {
            return Err(CheckupError::InvalidConfig {
                details: "paths.store_db and paths.report_log must differ".to_string(),
            });
        }

        if self.logging.activity_log_enabled {
            if self.paths.activity_log.as_os_str().is_empty() {
                return Err(CheckupError::InvalidConfig {
                    details: "paths.activity_log must not be empty when the activity log is enabled"
                        .to_string(),
                });
            }
            if self.logging.max_size_bytes == 0 {
                return Err(CheckupError::InvalidConfig {
                    details: "logging.max_size_bytes must be > 0".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.parse::<usize>()
        .map_err(|error| CheckupError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.parse::<bool>()
        .map_err(|error| CheckupError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
