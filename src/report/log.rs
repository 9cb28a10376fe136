//! Append-only report log. Never rotated or truncated.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::core::errors::{CheckupError, Result};

/// Append one rendered report block to the log at `path`, creating it if needed.
///
/// The block is written with a single `write_all` so a concurrent reader never
/// sees half a header.
pub fn append_report(path: &Path, rendered: &str) -> Result<()> {
    let log_write = |source: std::io::Error| CheckupError::LogWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(log_write)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(log_write)?;
    file.write_all(rendered.as_bytes()).map_err(log_write)?;
    file.flush().map_err(log_write)?;
    Ok(())
}
