//! Report generation and the append-only report log.

pub mod clock;
pub mod log;
pub mod render;
