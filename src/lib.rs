#![forbid(unsafe_code)]

//! checkup: directory integrity monitor.
//!
//! Every regular file under a scan root is fingerprinted (SHA-256) and
//! remembered in a SQLite record store. Each run flags files as:
//! 1. **new**: first seen on this run
//! 2. **ok**: fingerprint unchanged
//! 3. **mismatch**: fingerprint changed since last recorded
//! 4. **missing**: recorded but no longer on disk
//!
//! and appends a human-readable report to the report log.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use checkup::prelude::*;
//!
//! # fn main() -> checkup::core::errors::Result<()> {
//! let config = Config::load(None)?;
//! let outcome = Monitor::new(&config).scan(std::path::Path::new("."), &SystemClock)?;
//! print!("{}", outcome.rendered);
//! # Ok(())
//! # }
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use checkup::store::sqlite::RecordStore;
//! use checkup::scanner::walker::{FileWalker, WalkerConfig};
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod monitor;
pub mod report;
pub mod scanner;
pub mod store;
