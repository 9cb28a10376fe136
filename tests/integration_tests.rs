//! Integration tests: CLI smoke tests and end-to-end scan/purge scenarios
//! against the real binary.

mod common;

use std::fs;

use serde_json::Value;

use common::{run_cli_case, write_file};

#[test]
fn help_command_prints_usage() {
    let work = tempfile::tempdir().unwrap();
    let result = run_cli_case("help_command_prints_usage", work.path(), &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: checkup"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
    for subcommand in ["scan", "purge", "status", "completions"] {
        assert!(
            result.stdout.contains(subcommand),
            "help does not list {subcommand}; log: {}",
            result.log_path.display()
        );
    }
}

#[test]
fn help_subcommand_prints_usage() {
    let work = tempfile::tempdir().unwrap();
    let result = run_cli_case("help_subcommand_prints_usage", work.path(), &["help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: checkup"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
    assert!(!work.path().join("checkup.db").exists());
    assert!(!work.path().join("checkup-activity.jsonl").exists());
}

#[test]
fn version_command_prints_version() {
    let work = tempfile::tempdir().unwrap();
    let result = run_cli_case("version_command_prints_version", work.path(), &["--version"]);
    assert!(result.status.success());
    assert!(
        result.stdout.contains("checkup"),
        "missing version output; log: {}",
        result.log_path.display()
    );
}

#[test]
fn missing_directory_fails_without_touching_store() {
    let work = tempfile::tempdir().unwrap();
    let result = run_cli_case(
        "missing_directory_fails_without_touching_store",
        work.path(),
        &["does-not-exist"],
    );
    assert_eq!(
        result.status.code(),
        Some(1),
        "expected user error; log: {}",
        result.log_path.display()
    );
    assert!(result.stderr.contains("does-not-exist not found"));
    assert!(!work.path().join("checkup.db").exists());
    assert!(!work.path().join("checkup.log").exists());
    assert!(!work.path().join("checkup-activity.jsonl").exists());
}

#[test]
fn file_argument_is_rejected_like_missing_directory() {
    let work = tempfile::tempdir().unwrap();
    write_file(work.path(), "plain.txt", b"not a dir");
    let result = run_cli_case("file_argument_is_rejected", work.path(), &["scan", "plain.txt"]);
    assert_eq!(result.status.code(), Some(1));
    assert!(result.stderr.contains("CHK-2001"));
}

#[test]
fn explicit_config_that_does_not_exist_is_a_user_error() {
    let work = tempfile::tempdir().unwrap();
    let result = run_cli_case(
        "explicit_config_missing",
        work.path(),
        &["--config", "nope.toml", "status"],
    );
    assert_eq!(result.status.code(), Some(1));
}

#[test]
fn first_scan_reports_new_files_and_appends_log() {
    let work = tempfile::tempdir().unwrap();
    write_file(work.path(), "data/a.txt", b"alpha");
    write_file(work.path(), "data/sub/b.txt", b"beta");

    let result = run_cli_case("first_scan", work.path(), &["data"]);
    assert!(
        result.status.success(),
        "scan failed; log: {}",
        result.log_path.display()
    );
    assert!(result.stdout.contains("New Files: 2\ndata/a.txt\ndata/sub/b.txt\n"));
    assert!(result.stdout.contains("Checksum Errors: 0"));
    assert!(result.stdout.contains("Missing Files: 0"));
    assert!(result.stdout.ends_with(&format!("{}\n", "=".repeat(50))));

    let log = fs::read_to_string(work.path().join("checkup.log")).unwrap();
    assert_eq!(log, result.stdout);

    let second = run_cli_case("first_scan_repeat", work.path(), &["scan", "data"]);
    assert!(second.status.success());
    assert!(second.stdout.contains("New Files: 0"));
    let log = fs::read_to_string(work.path().join("checkup.log")).unwrap();
    assert_eq!(log, format!("{}{}", result.stdout, second.stdout));
}

#[test]
fn modified_file_is_reported_once_as_checksum_error() {
    let work = tempfile::tempdir().unwrap();
    let target = write_file(work.path(), "data/a.txt", b"original");
    write_file(work.path(), "data/b.txt", b"steady");

    assert!(run_cli_case("mismatch_seed", work.path(), &["data"]).status.success());
    fs::write(&target, b"tampered").unwrap();

    let changed = run_cli_case("mismatch_detect", work.path(), &["data"]);
    assert!(changed.status.success());
    assert!(
        changed.stdout.contains("Checksum Errors: 1\ndata/a.txt\n"),
        "log: {}",
        changed.log_path.display()
    );

    let settled = run_cli_case("mismatch_settled", work.path(), &["data"]);
    assert!(settled.stdout.contains("Checksum Errors: 0"));
    assert!(settled.stdout.contains("New Files: 0"));
}

#[test]
fn deleted_file_goes_missing_then_purge_removes_it() {
    let work = tempfile::tempdir().unwrap();
    let doomed = write_file(work.path(), "data/doomed.txt", b"bye");
    write_file(work.path(), "data/kept.txt", b"stay");

    assert!(run_cli_case("purge_seed", work.path(), &["data"]).status.success());
    fs::remove_file(&doomed).unwrap();

    let scan = run_cli_case("purge_scan", work.path(), &["data"]);
    assert!(scan.stdout.contains("Missing Files: 1\ndata/doomed.txt\n"));

    let purge = run_cli_case("purge_first", work.path(), &["purge"]);
    assert!(purge.status.success());
    assert_eq!(purge.stdout.trim(), "1 entries deleted");

    let again = run_cli_case("purge_second", work.path(), &["purge"]);
    assert!(again.status.success());
    assert_eq!(again.stdout.trim(), "No missing files found");

    let after = run_cli_case("purge_rescan", work.path(), &["data"]);
    assert!(after.stdout.contains("Missing Files: 0"));
}

#[test]
fn scanning_working_directory_ignores_own_files() {
    let work = tempfile::tempdir().unwrap();
    write_file(work.path(), "notes.txt", b"watch me");

    let first = run_cli_case("own_files_first", work.path(), &[]);
    assert!(first.status.success(), "log: {}", first.log_path.display());
    assert!(first.stdout.contains("New Files: 1\n./notes.txt\n"));

    let second = run_cli_case("own_files_second", work.path(), &[]);
    assert!(second.stdout.contains("New Files: 0"), "log: {}", second.log_path.display());
    assert!(second.stdout.contains("Checksum Errors: 0"));
}

#[test]
fn status_json_reports_counts() {
    let work = tempfile::tempdir().unwrap();
    write_file(work.path(), "data/a.txt", b"a");
    write_file(work.path(), "data/b.txt", b"b");
    assert!(run_cli_case("status_seed", work.path(), &["data"]).status.success());
    assert!(run_cli_case("status_seed_again", work.path(), &["data"]).status.success());

    let result = run_cli_case("status_json", work.path(), &["status", "--json"]);
    assert!(result.status.success());
    let payload: Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(payload["command"], "status");
    assert_eq!(payload["counts"]["ok"], 2);
    assert_eq!(payload["total"], 2);
}

#[test]
fn scan_json_payload_omits_rendered_text() {
    let work = tempfile::tempdir().unwrap();
    write_file(work.path(), "data/a.txt", b"a");

    let result = run_cli_case("scan_json", work.path(), &["--json", "data"]);
    assert!(result.status.success());
    let payload: Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(payload["command"], "scan");
    assert_eq!(payload["counts"]["new"], 1);
    assert_eq!(payload["report"]["new_files"]["paths"][0], "data/a.txt");
    assert!(payload.get("rendered").is_none());
}

#[test]
fn quiet_scan_prints_nothing_but_still_logs() {
    let work = tempfile::tempdir().unwrap();
    write_file(work.path(), "data/a.txt", b"a");

    let result = run_cli_case("quiet_scan", work.path(), &["-q", "scan", "data"]);
    assert!(result.status.success());
    assert!(result.stdout.is_empty());
    let log = fs::read_to_string(work.path().join("checkup.log")).unwrap();
    assert!(log.contains("New Files: 1"));
}

#[test]
fn completions_generate_script() {
    let work = tempfile::tempdir().unwrap();
    let result = run_cli_case("completions_bash", work.path(), &["completions", "bash"]);
    assert!(result.status.success());
    assert!(result.stdout.contains("checkup"));
}
