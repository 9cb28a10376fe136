//! File discovery, fingerprinting and reconciliation against the record store.

pub mod digest;
pub mod missing;
pub mod reconcile;
pub mod walker;
