//! Purge: irreversible removal of every `missing` record.

use crate::core::errors::Result;
use crate::store::record::Flag;
use crate::store::sqlite::RecordStore;

/// Delete every record flagged `missing`; returns how many were removed.
pub fn purge(store: &mut RecordStore) -> Result<u64> {
    store.delete(Flag::Missing)
}

/// Operator-facing summary line.
pub fn purge_message(removed: u64) -> String {
    if removed == 0 {
        "No missing files found".to_string()
    } else {
        format!("{removed} entries deleted")
    }
}
