//! CHK-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, CheckupError>;

/// Top-level error type for checkup.
#[derive(Debug, Error)]
pub enum CheckupError {
    #[error("[CHK-1001] invalid usage: {details}")]
    InvalidUsage { details: String },

    #[error("[CHK-1002] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CHK-1003] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CHK-1004] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CHK-2001] directory: {path} not found")]
    DirectoryNotFound { path: PathBuf },

    #[error("[CHK-2101] unable to open record store {path}: {details}")]
    StoreOpen { path: PathBuf, details: String },

    #[error("[CHK-2102] SQL failure in {context}: {details}")]
    Sql {
        context: &'static str,
        details: String,
    },

    #[error("[CHK-2103] record already exists for {path}")]
    DuplicateRecord { path: String },

    #[error("[CHK-2201] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CHK-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CHK-3002] unable to update report log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CheckupError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidUsage { .. } => "CHK-1001",
            Self::InvalidConfig { .. } => "CHK-1002",
            Self::MissingConfig { .. } => "CHK-1003",
            Self::ConfigParse { .. } => "CHK-1004",
            Self::DirectoryNotFound { .. } => "CHK-2001",
            Self::StoreOpen { .. } => "CHK-2101",
            Self::Sql { .. } => "CHK-2102",
            Self::DuplicateRecord { .. } => "CHK-2103",
            Self::Serialization { .. } => "CHK-2201",
            Self::Io { .. } => "CHK-3001",
            Self::LogWrite { .. } => "CHK-3002",
        }
    }

    /// Whether retrying the same run might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Sql { .. } | Self::StoreOpen { .. } | Self::LogWrite { .. }
        )
    }

    /// Errors caused by what the operator asked for rather than the environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUsage { .. }
                | Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::DirectoryNotFound { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<rusqlite::Error> for CheckupError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql {
            context: "rusqlite",
            details: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for CheckupError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for CheckupError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
