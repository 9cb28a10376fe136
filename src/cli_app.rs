//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use checkup::core::config::Config;
use checkup::core::errors::CheckupError;
use checkup::monitor::pipeline::{Monitor, Progress, ScanOutcome};
use checkup::monitor::purge::purge_message;
use checkup::report::clock::SystemClock;
use checkup::store::record::{Flag, FlagCounts};

/// checkup: directory integrity monitor.
#[derive(Debug, Parser)]
#[command(
    name = "checkup",
    author,
    version,
    about = "Directory integrity monitor: fingerprints files and reports new, changed and missing ones",
    long_about = None
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Print per-phase progress.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Directory to scan when no subcommand is given (use `scan <DIR>` for a
    /// directory named like a subcommand).
    #[arg(value_name = "DIRECTORY")]
    directory: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Fingerprint every file under a directory and append a report.
    Scan(ScanArgs),
    /// Delete every record flagged missing.
    Purge,
    /// Show record counts per flag without scanning.
    Status,
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Directory to scan.
    #[arg(value_name = "DIRECTORY", default_value = ".")]
    directory: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input: bad directory, bad config.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure: store, filesystem.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

impl From<CheckupError> for CliError {
    fn from(err: CheckupError) -> Self {
        if err.is_user_error() {
            Self::User(err.to_string())
        } else {
            Self::Runtime(err.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        None => run_scan(cli, cli.directory.as_deref().unwrap_or_else(|| Path::new("."))),
        Some(Command::Scan(args)) => run_scan(cli, &args.directory),
        Some(Command::Purge) => run_purge(cli),
        Some(Command::Status) => run_status(cli),
        Some(Command::Completions(args)) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Ok(Config::load(cli.config.as_deref())?)
}

fn run_scan(cli: &Cli, directory: &Path) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut monitor = Monitor::new(&config);
    if cli.verbose {
        monitor = monitor.with_progress(print_progress);
    }
    let outcome = monitor.scan(directory, &SystemClock)?;

    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                print!("{}", outcome.rendered);
                io::stdout().flush()?;
            }
            if let Some(message) = &outcome.log_error {
                eprintln!("{} {message}", "[CHK-3002]".yellow().bold());
            }
            if cli.verbose {
                eprintln!(
                    "[CHK-SCAN] {} files in {} ms",
                    outcome.summary.files_seen(),
                    outcome.elapsed_ms
                );
            }
        }
        OutputMode::Json => write_json_line(&scan_payload(&outcome)?)?,
    }
    Ok(())
}

fn run_purge(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let removed = Monitor::new(&config).purge()?;

    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                println!("{}", purge_message(removed));
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "purge",
            "removed": removed,
            "message": purge_message(removed),
        }))?,
    }
    Ok(())
}

fn run_status(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let counts = Monitor::new(&config).status()?;

    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                println!("Store: {}", config.paths.store_db.display());
                print!("{}", format_counts(&counts));
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "status",
            "store": config.paths.store_db.to_string_lossy(),
            "counts": counts,
            "total": counts.total(),
        }))?,
    }
    Ok(())
}

fn print_progress(progress: &Progress<'_>) {
    match progress {
        Progress::StoreOpened(path) => {
            eprintln!("[CHK-SCAN] store opened: {}", path.display());
        }
        Progress::MissingScanned(missing) => eprintln!(
            "[CHK-SCAN] checked {} records, {} newly missing",
            missing.checked,
            missing.newly_missing.len()
        ),
        Progress::Reconciled(summary) => eprintln!(
            "[CHK-SCAN] reconciled: {} new, {} ok, {} mismatch, {} unreadable",
            summary.new,
            summary.ok,
            summary.mismatch,
            summary.unreadable.len()
        ),
    }
}

fn format_counts(counts: &FlagCounts) -> String {
    let mut out = String::new();
    for flag in Flag::ALL {
        let count = counts.get(flag);
        let label = format!("{:<9}", flag.as_str());
        let label = match flag {
            Flag::Mismatch | Flag::Missing if count > 0 => label.red().to_string(),
            Flag::New if count > 0 => label.yellow().to_string(),
            _ => label,
        };
        out.push_str(&format!("  {label}{count}\n"));
    }
    out.push_str(&format!("  {:<9}{}\n", "total", counts.total()));
    out
}

fn scan_payload(outcome: &ScanOutcome) -> Result<Value, CliError> {
    let mut payload = serde_json::to_value(outcome)?;
    if let Value::Object(map) = &mut payload {
        map.remove("rendered");
        map.insert("command".to_string(), Value::from("scan"));
    }
    Ok(payload)
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("CHECKUP_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human" | "auto") | None => OutputMode::Human,
        Some(_) => OutputMode::Human,
    }
}
