//! Missing-file scan over the whole record store.
//!
//! Checks every tracked path, not only those under the current scan root, so
//! a file that moved out of the scanned subtree is still reported missing.

use std::path::Path;

use serde::Serialize;

use crate::core::errors::Result;
use crate::store::sqlite::RecordStore;

/// Outcome of one missing-file scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingScan {
    /// Tracked paths examined.
    pub checked: u64,
    /// Paths whose flag changed to `missing` during this scan.
    pub newly_missing: Vec<String>,
}

/// Flag every tracked path that no longer resolves to a regular file.
pub fn scan_missing(store: &mut RecordStore) -> Result<MissingScan> {
    let mut outcome = MissingScan::default();
    for path in store.paths()? {
        outcome.checked += 1;
        if !Path::new(&path).is_file() && store.mark_missing(&path)? {
            outcome.newly_missing.push(path);
        }
    }
    Ok(outcome)
}
