//! Persistent record store: path → digest, flag, last-checked.

pub mod record;
pub mod sqlite;
