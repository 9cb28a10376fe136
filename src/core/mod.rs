//! Core types: errors, configuration, path handling.

pub mod config;
pub mod errors;
pub mod paths;
