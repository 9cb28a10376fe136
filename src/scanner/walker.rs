//! Sequential, deterministic directory walker.
//!
//! Yields every regular file below the root, hidden entries included. Within a
//! directory, entries are visited in file-name order; a directory's files are
//! yielded before any of its subdirectories are entered. Directories that
//! cannot be listed, and entries whose type cannot be read, are yielded as
//! [`WalkItem::Unreadable`] instead of being dropped.
//!
//! Paths in [`ExcludedFiles`] are skipped. The scan pipeline uses this for
//! checkup's own record store and logs, so those files never get a record even
//! when they live under the scanned root; every other file below the root does.

#![allow(missing_docs)]

use std::collections::{HashSet, VecDeque};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Walker configuration derived from `ScanConfig`.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub root: PathBuf,
    /// Directory levels below the root to descend (0 = root only).
    pub max_depth: usize,
    pub follow_symlinks: bool,
    /// Files never yielded (the store and logs of this run).
    pub excluded_files: ExcludedFiles,
}

/// A single item discovered during a walk.
#[derive(Debug)]
pub enum WalkItem {
    /// A regular file (or a symlink resolving to one).
    File(PathBuf),
    /// A path that could not be inspected or listed.
    Unreadable { path: PathBuf, source: io::Error },
}

/// Set of files to skip, matched by canonical path.
///
/// Only entries whose file name matches an excluded name are canonicalized,
/// so the common case costs one hash lookup per file.
#[derive(Debug, Clone, Default)]
pub struct ExcludedFiles {
    names: HashSet<OsString>,
    canonical: HashSet<PathBuf>,
}

impl ExcludedFiles {
    /// Exclude `path`; ignored if it does not exist yet.
    pub fn insert(&mut self, path: &Path) {
        let (Some(name), Ok(canonical)) = (path.file_name(), fs::canonicalize(path)) else {
            return;
        };
        self.names.insert(name.to_os_string());
        self.canonical.insert(canonical);
    }

    fn contains(&self, path: &Path) -> bool {
        if self.canonical.is_empty() {
            return false;
        }
        match path.file_name() {
            Some(name) if self.names.contains(name) => fs::canonicalize(path)
                .map(|c| self.canonical.contains(&c))
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Depth-first walker over one root.
pub struct FileWalker {
    config: WalkerConfig,
}

impl FileWalker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Lazily walk the tree.
    pub fn walk(&self) -> Walk<'_> {
        let mut visited = HashSet::new();
        if self.config.follow_symlinks
            && let Ok(canonical) = fs::canonicalize(&self.config.root)
        {
            visited.insert(canonical);
        }
        Walk {
            config: &self.config,
            pending_dirs: vec![(self.config.root.clone(), 0)],
            ready: VecDeque::new(),
            visited,
        }
    }
}

/// Iterator returned by [`FileWalker::walk`].
pub struct Walk<'a> {
    config: &'a WalkerConfig,
    /// Stack of (directory, depth); popped in file-name order.
    pending_dirs: Vec<(PathBuf, usize)>,
    ready: VecDeque<WalkItem>,
    /// Canonical directories already entered, tracked only when following
    /// symlinks so a link cycle cannot loop forever.
    visited: HashSet<PathBuf>,
}

impl Iterator for Walk<'_> {
    type Item = WalkItem;

    fn next(&mut self) -> Option<WalkItem> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }
            let (dir, depth) = self.pending_dirs.pop()?;
            self.process_directory(&dir, depth);
        }
    }
}

impl Walk<'_> {
    fn process_directory(&mut self, dir_path: &Path, depth: usize) {
        let entries = match fs::read_dir(dir_path) {
            Ok(entries) => entries,
            Err(source) => {
                self.ready.push_back(WalkItem::Unreadable {
                    path: dir_path.to_path_buf(),
                    source,
                });
                return;
            }
        };

        let mut children = Vec::new();
        for entry_result in entries {
            match entry_result {
                Ok(entry) => children.push(entry),
                Err(source) => self.ready.push_back(WalkItem::Unreadable {
                    path: dir_path.to_path_buf(),
                    source,
                }),
            }
        }
        children.sort_by_key(fs::DirEntry::file_name);

        let mut subdirs = Vec::new();
        for entry in children {
            self.classify(entry.path(), entry.file_type(), &mut subdirs);
        }

        if depth >= self.config.max_depth {
            return;
        }

        // Reverse so the stack pops subdirectories in ascending name order.
        for child in subdirs.into_iter().rev() {
            if self.config.follow_symlinks
                && let Ok(canonical) = fs::canonicalize(&child)
                && !self.visited.insert(canonical)
            {
                continue;
            }
            self.pending_dirs.push((child, depth + 1));
        }
    }

    /// Route one directory entry: queue files, collect subdirectories, and
    /// report entries whose type cannot be determined.
    fn classify(
        &mut self,
        child_path: PathBuf,
        file_type: io::Result<fs::FileType>,
        subdirs: &mut Vec<PathBuf>,
    ) {
        let ft = match file_type {
            Ok(ft) => ft,
            Err(source) => {
                self.ready.push_back(WalkItem::Unreadable {
                    path: child_path,
                    source,
                });
                return;
            }
        };

        if ft.is_symlink() {
            match fs::metadata(&child_path) {
                Ok(target) if target.is_file() => self.push_file(child_path),
                Ok(target) if target.is_dir() => {
                    if self.config.follow_symlinks {
                        subdirs.push(child_path);
                    }
                }
                Ok(_) => {}
                Err(source) => self.ready.push_back(WalkItem::Unreadable {
                    path: child_path,
                    source,
                }),
            }
        } else if ft.is_dir() {
            subdirs.push(child_path);
        } else if ft.is_file() {
            self.push_file(child_path);
        }
        // FIFOs, sockets and device nodes have no stable content to hash.
    }

    fn push_file(&mut self, path: PathBuf) {
        if !self.config.excluded_files.contains(&path) {
            self.ready.push_back(WalkItem::File(path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> WalkerConfig {
        WalkerConfig {
            root: root.to_path_buf(),
            max_depth: usize::MAX,
            follow_symlinks: false,
            excluded_files: ExcludedFiles::default(),
        }
    }

    fn files(walker: &FileWalker) -> Vec<PathBuf> {
        walker
            .walk()
            .filter_map(|item| match item {
                WalkItem::File(p) => Some(p),
                WalkItem::Unreadable { .. } => None,
            })
            .collect()
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
    }

    #[test]
    fn visits_all_files_in_deterministic_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.txt"));
        touch(&root.join("a.txt"));
        touch(&root.join("sub/z.txt"));
        touch(&root.join("sub/deeper/y.txt"));
        touch(&root.join("another/x.txt"));

        let walker = FileWalker::new(config(root));
        let seen = files(&walker);
        assert_eq!(
            seen,
            vec![
                root.join("a.txt"),
                root.join("b.txt"),
                root.join("another/x.txt"),
                root.join("sub/z.txt"),
                root.join("sub/deeper/y.txt"),
            ]
        );
        assert_eq!(seen, files(&walker));
    }

    #[test]
    fn hidden_entries_are_included() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join(".hidden"));
        touch(&dir.path().join(".git/config"));

        let seen = files(&FileWalker::new(config(dir.path())));
        assert!(seen.contains(&dir.path().join(".hidden")));
        assert!(seen.contains(&dir.path().join(".git/config")));
    }

    #[test]
    fn paths_keep_root_spelling() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("f.txt"));
        let spelled = dir.path().join(".");
        let seen = files(&FileWalker::new(config(&spelled)));
        assert_eq!(seen, vec![spelled.join("f.txt")]);
    }

    #[test]
    fn max_depth_limits_descent() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("top.txt"));
        touch(&dir.path().join("one/mid.txt"));
        touch(&dir.path().join("one/two/low.txt"));

        let mut cfg = config(dir.path());
        cfg.max_depth = 1;
        let seen = files(&FileWalker::new(cfg));
        assert_eq!(seen.len(), 2);
        assert!(!seen.contains(&dir.path().join("one/two/low.txt")));
    }

    #[test]
    fn excluded_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("checkup.db"));
        touch(&dir.path().join("sub/checkup.db"));
        touch(&dir.path().join("data.txt"));

        let mut cfg = config(dir.path());
        cfg.excluded_files.insert(&dir.path().join("checkup.db"));
        let seen = files(&FileWalker::new(cfg));
        assert_eq!(
            seen,
            vec![dir.path().join("data.txt"), dir.path().join("sub/checkup.db")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_to_files_are_hashed_through_and_broken_links_reported() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("real.txt"));
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("broken"))
            .unwrap();

        let items: Vec<WalkItem> = FileWalker::new(config(dir.path())).walk().collect();
        let file_count = items
            .iter()
            .filter(|i| matches!(i, WalkItem::File(_)))
            .count();
        assert_eq!(file_count, 2);
        assert!(items.iter().any(|i| matches!(
            i,
            WalkItem::Unreadable { path, .. } if path.ends_with("broken")
        )));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_terminates_when_following() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a/file.txt"));
        std::os::unix::fs::symlink(dir.path(), dir.path().join("a/loop")).unwrap();

        let mut cfg = config(dir.path());
        cfg.follow_symlinks = true;
        let seen = files(&FileWalker::new(cfg));
        assert_eq!(seen, vec![dir.path().join("a/file.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_dirs_not_followed_by_default() {
        let outside = tempfile::tempdir().unwrap();
        touch(&outside.path().join("elsewhere.txt"));
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("ext")).unwrap();

        assert!(files(&FileWalker::new(config(dir.path()))).is_empty());
    }

    #[test]
    fn entry_with_unknown_type_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let walker = FileWalker::new(config(dir.path()));
        let mut walk = walker.walk();
        let mut subdirs = Vec::new();

        walk.classify(
            dir.path().join("vanished"),
            Err(io::Error::from(io::ErrorKind::NotFound)),
            &mut subdirs,
        );

        assert!(subdirs.is_empty());
        match walk.ready.pop_front() {
            Some(WalkItem::Unreadable { path, source }) => {
                assert_eq!(path, dir.path().join("vanished"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected unreadable entry, got {other:?}"),
        }
    }
}
