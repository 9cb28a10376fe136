//! Operations exposed to the CLI: full scan, purge, status.

pub mod pipeline;
pub mod purge;
