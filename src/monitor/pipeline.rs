//! Full-scan pipeline: missing scan → reconciliation → report.
//!
//! The record store is opened per operation and closed when the operation
//! returns, on success and on every error path.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::core::config::Config;
use crate::core::errors::{CheckupError, Result};
use crate::core::paths::{display_path, resolve_scan_root};
use crate::logger::jsonl::{EventCounts, EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use crate::monitor::purge::purge;
use crate::report::clock::Clock;
use crate::report::log::append_report;
use crate::report::render::{Report, generate_report};
use crate::scanner::digest::{DigestProvider, Sha256Digest};
use crate::scanner::missing::{MissingScan, scan_missing};
use crate::scanner::reconcile::{ReadErrorPolicy, ReconcileSummary, reconcile};
use crate::scanner::walker::{ExcludedFiles, FileWalker, WalkerConfig};
use crate::store::record::FlagCounts;
use crate::store::sqlite::RecordStore;

/// Milestones reported to a progress callback during a scan.
#[derive(Debug)]
pub enum Progress<'p> {
    StoreOpened(&'p Path),
    MissingScanned(&'p MissingScan),
    Reconciled(&'p ReconcileSummary),
}

/// Everything a completed scan produced.
#[derive(Debug, Serialize)]
pub struct ScanOutcome {
    /// Scan root as used for record keys.
    pub root: String,
    pub missing: MissingScan,
    pub summary: ReconcileSummary,
    pub counts: FlagCounts,
    pub report: Report,
    /// Report text as appended to the log.
    pub rendered: String,
    /// Set when the report could not be appended to the log; the scan itself
    /// still succeeded.
    pub log_error: Option<String>,
    pub elapsed_ms: u64,
}

type ProgressFn<'a> = Box<dyn FnMut(&Progress<'_>) + 'a>;

/// Runs scan, purge and status operations against the configured store.
pub struct Monitor<'a> {
    config: &'a Config,
    /// Opened on first use, once the run has validated its inputs.
    activity: Option<JsonlWriter>,
    provider: Box<dyn DigestProvider + 'a>,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> Monitor<'a> {
    /// Monitor using SHA-256 fingerprints and the configured activity log.
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            activity: None,
            provider: Box::new(Sha256Digest),
            progress: None,
        }
    }

    /// Replace the fingerprint function.
    #[must_use]
    pub fn with_digest_provider<D>(mut self, provider: D) -> Self
    where
        D: DigestProvider + 'a,
    {
        self.provider = Box::new(provider);
        self
    }

    /// Set a callback invoked after each scan phase.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Progress<'_>) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Full scan of `root`.
    ///
    /// A bad root fails before the store is opened; a store that cannot be
    /// opened fails before anything is scanned.
    pub fn scan<C: Clock + ?Sized>(&mut self, root: &Path, clock: &C) -> Result<ScanOutcome> {
        let result = self.scan_inner(root, clock);
        if let Err(err) = &result {
            // Only runs that got past root validation have an activity log.
            self.log_if_open(
                &LogEntry::new(EventType::Error, Severity::Critical)
                    .with_path(display_path(root))
                    .with_error(err),
            );
        }
        if let Some(activity) = self.activity.as_mut() {
            activity.flush();
        }
        result
    }

    /// Remove every `missing` record; returns the number removed.
    pub fn purge(&mut self) -> Result<u64> {
        let result = RecordStore::open(&self.config.paths.store_db)
            .and_then(|mut store| purge(&mut store));
        let entry = match &result {
            Ok(removed) => {
                LogEntry::new(EventType::Purge, Severity::Info).with_counts(EventCounts {
                    purged: *removed,
                    ..EventCounts::default()
                })
            }
            Err(err) => LogEntry::new(EventType::Error, Severity::Critical).with_error(err),
        };
        let activity = self.activity();
        activity.write_entry(&entry);
        activity.flush();
        result
    }

    /// Per-flag record counts, without scanning.
    pub fn status(&self) -> Result<FlagCounts> {
        RecordStore::open(&self.config.paths.store_db)?.counts()
    }

    fn scan_inner<C: Clock + ?Sized>(&mut self, root: &Path, clock: &C) -> Result<ScanOutcome> {
        let start = Instant::now();
        let root = resolve_scan_root(root, self.config.scan.canonicalize_paths)?;
        let root_key = display_path(&root);

        let mut entry = LogEntry::new(EventType::ScanStart, Severity::Info).with_path(&*root_key);
        entry.config_hash = self.config.stable_hash().ok();
        self.activity().write_entry(&entry);

        let mut store = RecordStore::open(&self.config.paths.store_db)?;
        self.notify(&Progress::StoreOpened(store.path()));

        let missing = scan_missing(&mut store)?;
        for path in &missing.newly_missing {
            self.activity()
                .write_entry(&LogEntry::new(EventType::FileMissing, Severity::Warning).with_path(path));
        }
        self.notify(&Progress::MissingScanned(&missing));

        let walker = FileWalker::new(WalkerConfig {
            root,
            max_depth: self.config.scan.max_depth,
            follow_symlinks: self.config.scan.follow_symlinks,
            excluded_files: self.own_files(),
        });
        let policy = if self.config.scan.abort_on_read_error {
            ReadErrorPolicy::Abort
        } else {
            ReadErrorPolicy::Report
        };
        let summary = reconcile(&walker, &mut store, self.provider.as_ref(), policy)?;
        for unreadable in &summary.unreadable {
            let mut entry = LogEntry::new(EventType::FileUnreadable, Severity::Warning)
                .with_path(&*unreadable.path);
            entry.error_message = Some(unreadable.reason.clone());
            self.activity().write_entry(&entry);
        }
        self.notify(&Progress::Reconciled(&summary));

        let report = generate_report(&store, clock, &summary.unreadable)?;
        let rendered = report.render();
        let log_error = match append_report(&self.config.paths.report_log, &rendered) {
            Ok(()) => None,
            Err(err) => {
                let path = display_path(&self.config.paths.report_log);
                self.activity().write_entry(
                    &LogEntry::new(EventType::ReportWriteFailed, Severity::Warning)
                        .with_path(path)
                        .with_error(&err),
                );
                Some(log_error_message(&err))
            }
        };

        let counts = store.counts()?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut entry = LogEntry::new(EventType::ScanComplete, Severity::Info)
            .with_path(&*root_key)
            .with_counts(EventCounts {
                new: counts.new,
                ok: counts.ok,
                mismatch: counts.mismatch,
                missing: counts.missing,
                unreadable: summary.unreadable.len() as u64,
                purged: 0,
            });
        entry.duration_ms = Some(elapsed_ms);
        self.activity().write_entry(&entry);

        Ok(ScanOutcome {
            root: root_key,
            missing,
            summary,
            counts,
            report,
            rendered,
            log_error,
            elapsed_ms,
        })
    }

    /// The store, its SQLite sidecars and both logs: never fingerprinted.
    fn own_files(&self) -> ExcludedFiles {
        let paths = &self.config.paths;
        let mut excluded = ExcludedFiles::default();
        excluded.insert(&paths.store_db);
        for suffix in ["-wal", "-shm", "-journal"] {
            excluded.insert(&with_suffix(&paths.store_db, suffix));
        }
        excluded.insert(&paths.report_log);
        if self.config.logging.activity_log_enabled {
            excluded.insert(&paths.activity_log);
            for i in 1..=self.config.logging.max_rotated_files {
                excluded.insert(&with_suffix(&paths.activity_log, &format!(".{i}")));
            }
        }
        excluded
    }

    fn activity(&mut self) -> &mut JsonlWriter {
        let config = self.config;
        self.activity.get_or_insert_with(|| {
            if config.logging.activity_log_enabled {
                JsonlWriter::open(JsonlConfig {
                    path: config.paths.activity_log.clone(),
                    max_size_bytes: config.logging.max_size_bytes,
                    max_rotated_files: config.logging.max_rotated_files,
                })
            } else {
                JsonlWriter::disabled()
            }
        })
    }

    fn log_if_open(&mut self, entry: &LogEntry) {
        if let Some(activity) = self.activity.as_mut() {
            activity.write_entry(entry);
        }
    }

    fn notify(&mut self, progress: &Progress<'_>) {
        if let Some(callback) = self.progress.as_mut() {
            callback(progress);
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn log_error_message(err: &CheckupError) -> String {
    match err {
        CheckupError::LogWrite { path, source } => {
            format!("Unable to update {}: {source}", path.display())
        }
        other => other.to_string(),
    }
}
