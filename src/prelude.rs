//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use checkup::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{CheckupError, Result};

// Store
pub use crate::store::record::{Digest, FileRecord, Flag, FlagCounts};
pub use crate::store::sqlite::RecordStore;

// Scanner
pub use crate::scanner::digest::{DigestProvider, Sha256Digest};
pub use crate::scanner::reconcile::{ReadErrorPolicy, ReconcileSummary, Unreadable};
pub use crate::scanner::walker::{FileWalker, WalkerConfig};

// Report
pub use crate::report::clock::{Clock, FixedClock, SystemClock};
pub use crate::report::render::Report;

// Monitor
pub use crate::monitor::pipeline::{Monitor, Progress, ScanOutcome};
pub use crate::monitor::purge::purge_message;
