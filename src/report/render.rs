//! Post-scan report: counts and path lists for new, changed, and missing files.

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::errors::Result;
use crate::report::clock::Clock;
use crate::scanner::reconcile::Unreadable;
use crate::store::record::Flag;
use crate::store::sqlite::RecordStore;

/// Width of the `=` line closing each report block.
pub const SEPARATOR_WIDTH: usize = 50;

/// Header format, e.g. `10-17-2026 09:05`.
const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M";

/// One labeled section of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub label: &'static str,
    pub count: u64,
    pub paths: Vec<String>,
}

/// Snapshot of the store after a scan, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub timestamp: String,
    pub new_files: Section,
    pub checksum_errors: Section,
    pub missing_files: Section,
    /// Paths this run could not read; rendered only when non-empty.
    pub unreadable: Vec<Unreadable>,
}

/// Label used for each reported flag; `ok` is never reported.
pub const fn section_label(flag: Flag) -> Option<&'static str> {
    match flag {
        Flag::New => Some("New Files"),
        Flag::Mismatch => Some("Checksum Errors"),
        Flag::Missing => Some("Missing Files"),
        Flag::Ok => None,
    }
}

fn section(store: &RecordStore, flag: Flag) -> Result<Section> {
    let label = section_label(flag).unwrap_or_else(|| flag.as_str());
    let count = store.count(flag)?;
    let paths = if count > 0 {
        store.select(flag)?.into_iter().map(|r| r.path).collect()
    } else {
        Vec::new()
    };
    Ok(Section {
        label,
        count,
        paths,
    })
}

/// Build the report from the store's current state.
///
/// Must run after both the missing scan and the walk so the counts describe
/// one consistent post-scan state.
pub fn generate_report<C: Clock + ?Sized>(
    store: &RecordStore,
    clock: &C,
    unreadable: &[Unreadable],
) -> Result<Report> {
    Ok(Report {
        timestamp: clock.now().format(TIMESTAMP_FORMAT).to_string(),
        new_files: section(store, Flag::New)?,
        checksum_errors: section(store, Flag::Mismatch)?,
        missing_files: section(store, Flag::Missing)?,
        unreadable: unreadable.to_vec(),
    })
}

impl Report {
    pub fn sections(&self) -> [&Section; 3] {
        [&self.new_files, &self.checksum_errors, &self.missing_files]
    }

    /// True when nothing needs the operator's attention.
    pub fn is_clean(&self) -> bool {
        self.sections().iter().all(|s| s.count == 0) && self.unreadable.is_empty()
    }

    /// Fixed textual layout appended to the log and echoed to the operator.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.timestamp);
        for section in self.sections() {
            let _ = writeln!(out, "\n{}: {}", section.label, section.count);
            for path in &section.paths {
                let _ = writeln!(out, "{path}");
            }
        }
        if !self.unreadable.is_empty() {
            let _ = writeln!(out, "\nUnreadable Files: {}", self.unreadable.len());
            for entry in &self.unreadable {
                let _ = writeln!(out, "{}: {}", entry.path, entry.reason);
            }
        }
        let _ = writeln!(out, "\n{}", "=".repeat(SEPARATOR_WIDTH));
        out
    }
}
