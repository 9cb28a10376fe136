//! Reconciliation: compare each walked file with its stored record.

use serde::Serialize;

use crate::core::errors::{CheckupError, Result};
use crate::core::paths::{display_path, record_key};
use crate::scanner::digest::DigestProvider;
use crate::scanner::walker::{FileWalker, WalkItem};
use crate::store::record::{Digest, Flag};
use crate::store::sqlite::RecordStore;

/// Reason given for walked paths that cannot be stored without loss.
pub const NON_UTF8_REASON: &str = "path is not valid UTF-8";

/// What to do when a walked file or directory cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadErrorPolicy {
    /// Record the path as unreadable and keep walking.
    #[default]
    Report,
    /// Fail the whole run.
    Abort,
}

/// A path this run could not fingerprint. Its record, if any, is left as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unreadable {
    pub path: String,
    pub reason: String,
}

/// Per-classification totals for one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub new: u64,
    pub ok: u64,
    pub mismatch: u64,
    pub unreadable: Vec<Unreadable>,
}

impl ReconcileSummary {
    pub fn files_seen(&self) -> u64 {
        self.new + self.ok + self.mismatch
    }

    fn tally(&mut self, flag: Flag) {
        match flag {
            Flag::New => self.new += 1,
            Flag::Ok => self.ok += 1,
            Flag::Mismatch => self.mismatch += 1,
            Flag::Missing => {}
        }
    }
}

/// Decide and apply the transition for one observed file.
///
/// Never yields [`Flag::Missing`]: a file seen now is present, whatever its
/// previous flag was.
pub fn reconcile_file(store: &mut RecordStore, path: &str, digest: &Digest) -> Result<Flag> {
    match store.get(path)? {
        None => {
            store.upsert_new(path, digest)?;
            Ok(Flag::New)
        }
        Some(record) if record.digest == *digest => {
            store.mark_ok(path)?;
            Ok(Flag::Ok)
        }
        Some(_) => {
            store.mark_mismatch(path, digest)?;
            Ok(Flag::Mismatch)
        }
    }
}

/// Walk the tree and reconcile every file against the store.
pub fn reconcile<D>(
    walker: &FileWalker,
    store: &mut RecordStore,
    provider: &D,
    policy: ReadErrorPolicy,
) -> Result<ReconcileSummary>
where
    D: DigestProvider + ?Sized,
{
    let mut summary = ReconcileSummary::default();

    for item in walker.walk() {
        let path = match item {
            WalkItem::File(path) => path,
            WalkItem::Unreadable { path, source } => {
                if policy == ReadErrorPolicy::Abort {
                    return Err(CheckupError::io(&path, source));
                }
                summary.unreadable.push(Unreadable {
                    path: display_path(&path),
                    reason: source.to_string(),
                });
                continue;
            }
        };

        let Some(key) = record_key(&path) else {
            summary.unreadable.push(Unreadable {
                path: display_path(&path),
                reason: NON_UTF8_REASON.to_string(),
            });
            continue;
        };

        let digest = match provider.digest(&path) {
            Ok(digest) => digest,
            Err(err) if policy == ReadErrorPolicy::Report => {
                let reason = match &err {
                    CheckupError::Io { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                summary.unreadable.push(Unreadable {
                    path: display_path(&path),
                    reason,
                });
                continue;
            }
            Err(err) => return Err(err),
        };

        let flag = reconcile_file(store, key, &digest)?;
        summary.tally(flag);
    }

    Ok(summary)
}
