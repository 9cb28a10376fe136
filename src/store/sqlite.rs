//! SQLite record store: one row per tracked path.
//!
//! Every mutation runs in its own short transaction, so an interrupted run
//! leaves each record either fully old or fully new. The scan as a whole is not
//! transactional; re-running it converges on the same state.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::core::errors::{CheckupError, Result};
use crate::store::record::{Digest, FileRecord, Flag, FlagCounts};

/// Handle on the persistent record store. Closed when dropped.
pub struct RecordStore {
    conn: Connection,
    path: PathBuf,
}

impl RecordStore {
    /// Open (or create) the store at `path`, applying schema and PRAGMAs.
    ///
    /// Any failure here is a [`CheckupError::StoreOpen`]: a run cannot proceed
    /// without a usable store.
    pub fn open(path: &Path) -> Result<Self> {
        let store_open = |details: String| CheckupError::StoreOpen {
            path: path.to_path_buf(),
            details,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| store_open(e.to_string()))?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| store_open(e.to_string()))?;

        apply_pragmas(&conn).map_err(|e| store_open(e.to_string()))?;
        apply_schema(&conn).map_err(|e| store_open(e.to_string()))?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Throwaway store for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record for `path`, if tracked.
    pub fn get(&self, path: &str) -> Result<Option<FileRecord>> {
        let record = self
            .conn
            .prepare_cached(
                "SELECT filename, hash, flag, last_checked FROM checkup WHERE filename = ?1",
            )?
            .query_row(params![path], row_to_record)
            .optional()?;
        Ok(record)
    }

    /// Start tracking `path` with `flag = new`.
    ///
    /// Fails with [`CheckupError::DuplicateRecord`] if `path` is already tracked.
    pub fn upsert_new(&mut self, path: &str, digest: &Digest) -> Result<()> {
        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT INTO checkup (filename, hash, flag, last_checked)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(filename) DO NOTHING",
            params![path, digest, Flag::New, now_timestamp()],
        )?;
        if inserted == 0 {
            return Err(CheckupError::DuplicateRecord {
                path: path.to_string(),
            });
        }
        tx.commit()?;
        Ok(())
    }

    /// Content unchanged: set `flag = ok`, keep the digest.
    ///
    /// Returns whether a record was updated.
    pub fn mark_ok(&mut self, path: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE checkup SET flag = ?2, last_checked = ?3 WHERE filename = ?1",
            params![path, Flag::Ok, now_timestamp()],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    /// Content changed: set `flag = mismatch` and store the new digest.
    pub fn mark_mismatch(&mut self, path: &str, digest: &Digest) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE checkup SET hash = ?2, flag = ?3, last_checked = ?4 WHERE filename = ?1",
            params![path, digest, Flag::Mismatch, now_timestamp()],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    /// Path vanished: set `flag = missing`, leaving digest and `last_checked`.
    ///
    /// Records that are already `missing` are not rewritten; returns whether
    /// the flag actually changed.
    pub fn mark_missing(&mut self, path: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE checkup SET flag = ?2 WHERE filename = ?1 AND flag != ?2",
            params![path, Flag::Missing],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    /// Number of records carrying `flag`.
    pub fn count(&self, flag: Flag) -> Result<u64> {
        let count: i64 = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM checkup WHERE flag = ?1")?
            .query_row(params![flag], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// All counts in one pass.
    pub fn counts(&self) -> Result<FlagCounts> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT flag, COUNT(*) FROM checkup GROUP BY flag")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, Flag>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut counts = FlagCounts::default();
        for (flag, n) in rows {
            *counts.slot(flag) = u64::try_from(n).unwrap_or(0);
        }
        Ok(counts)
    }

    /// Records carrying `flag`, in insertion order.
    pub fn select(&self, flag: Flag) -> Result<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT filename, hash, flag, last_checked FROM checkup
             WHERE flag = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![flag], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Every tracked path, in insertion order.
    pub fn paths(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT filename FROM checkup ORDER BY rowid ASC")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Delete every record carrying `flag`; returns the number removed.
    pub fn delete(&mut self, flag: Flag) -> Result<u64> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM checkup WHERE flag = ?1", params![flag])?;
        tx.commit()?;
        Ok(deleted as u64)
    }

    /// Check that WAL mode is active (for diagnostics).
    pub fn is_wal_mode(&self) -> bool {
        self.conn
            .query_row("PRAGMA journal_mode", [], |row| row.get::<_, String>(0))
            .map(|mode| mode.eq_ignore_ascii_case("wal"))
            .unwrap_or(false)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        path: row.get(0)?,
        digest: row.get(1)?,
        flag: row.get(2)?,
        last_checked: row.get(3)?,
    })
}

/// Same layout SQLite uses for `CURRENT_TIMESTAMP`.
fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ──────────────────── schema & pragmas ────────────────────

fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        eprintln!("[CHK-SQLITE] WARNING: requested WAL mode but got '{mode}'");
    }
    Ok(())
}

fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS checkup (
            filename TEXT PRIMARY KEY NOT NULL,
            hash TEXT NOT NULL,
            flag TEXT NOT NULL CHECK (flag IN ('new', 'ok', 'mismatch', 'missing')),
            last_checked DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_checkup_flag ON checkup(flag);",
    )
}

// ──────────────────── tests ────────────────────
