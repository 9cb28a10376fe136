//! Value types persisted in the record store.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification attached to a tracked path after the most recent scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    /// First observed during the most recent scan.
    New,
    /// Content unchanged since the previous scan.
    Ok,
    /// Content changed since the previous scan.
    Mismatch,
    /// Path no longer resolved to a file at the start of the most recent scan.
    Missing,
}

impl Flag {
    /// Every flag, in report order followed by `ok`.
    pub const ALL: [Self; 4] = [Self::New, Self::Mismatch, Self::Missing, Self::Ok];

    /// Stored spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Ok => "ok",
            Self::Mismatch => "mismatch",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored flag value that is not one of the four known spellings.
#[derive(Debug, Error)]
#[error("unknown flag value {0:?}")]
pub struct UnknownFlag(pub String);

impl FromStr for Flag {
    type Err = UnknownFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "ok" => Ok(Self::Ok),
            "mismatch" => Ok(Self::Mismatch),
            "missing" => Ok(Self::Missing),
            other => Err(UnknownFlag(other.to_string())),
        }
    }
}

impl ToSql for Flag {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Flag {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Lowercase hex content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Wrap an already hex-encoded fingerprint (e.g. read back from the store).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ToSql for Digest {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Digest {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Self::from_hex)
    }
}

/// One row of the `checkup` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path exactly as recorded; the only identity key.
    pub path: String,
    pub digest: Digest,
    pub flag: Flag,
    /// `YYYY-MM-DD HH:MM:SS` UTC of the last insert or update.
    pub last_checked: String,
}

/// Record counts per flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlagCounts {
    pub new: u64,
    pub ok: u64,
    pub mismatch: u64,
    pub missing: u64,
}

impl FlagCounts {
    pub fn get(&self, flag: Flag) -> u64 {
        match flag {
            Flag::New => self.new,
            Flag::Ok => self.ok,
            Flag::Mismatch => self.mismatch,
            Flag::Missing => self.missing,
        }
    }

    pub(crate) fn slot(&mut self, flag: Flag) -> &mut u64 {
        match flag {
            Flag::New => &mut self.new,
            Flag::Ok => &mut self.ok,
            Flag::Mismatch => &mut self.mismatch,
            Flag::Missing => &mut self.missing,
        }
    }

    pub fn total(&self) -> u64 {
        self.new + self.ok + self.mismatch + self.missing
    }
}
