//! Scan-root resolution and record-key conversion.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::core::errors::{CheckupError, Result};

/// Validate the scan root and apply the configured key policy.
///
/// The root must exist and be a directory. With `canonicalize` off the root is
/// returned exactly as given, so record keys keep the operator's spelling
/// (`./src/lib.rs` and `/home/me/proj/src/lib.rs` are different records).
/// With `canonicalize` on the root is made absolute and symlink-resolved.
pub fn resolve_scan_root(root: &Path, canonicalize: bool) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(CheckupError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    if canonicalize {
        Ok(resolve_absolute_path(root))
    } else {
        Ok(root.to_path_buf())
    }
}

/// Resolve a path to an absolute, normalized path.
///
/// Uses `fs::canonicalize` when the path exists; otherwise the path is made
/// absolute against the CWD and `.`/`..` are resolved syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

/// The string under which a walked path is stored.
///
/// `None` for paths that are not valid UTF-8: a replaced byte would let two
/// distinct files share one key, and the key would no longer name the file.
pub fn record_key(path: &Path) -> Option<&str> {
    path.to_str()
}

/// Lossy display form for reports and activity-log entries.
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}
