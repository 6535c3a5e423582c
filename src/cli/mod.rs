use std::env;
use std::fs::OpenOptions;
use std::io::{self, BufRead, IsTerminal};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::error::{ContextKind, ErrorKind};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::Cli;
use crate::config::{load_settings, Settings};
use crate::types::{OperationKind, OperationRequest, Outcome, Secret};
use crate::util::command::SystemRunner;
use crate::workflow::Workflow;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const USAGE_HINT: &str = "Run 'zfs-backup --help' for usage information";
const PERMISSION_HINT: &str = "insufficient permissions to run ZFS commands.\nPlease run with: sudo zfs-backup\nOr configure ZFS delegation for your user";

pub mod args;

pub fn run() -> Result<()> {
    let cli = parse_cli();
    if cli.help {
        print_help();
        return Ok(());
    }

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => fail(&err.to_string()),
    };
    let mode = cli.mode();
    match (mode, settings.log_file.as_deref()) {
        (Some(_), _) => init_tracing(cli.verbose, None)?,
        (None, Some(path)) => init_tracing(cli.verbose, Some(path))?,
        (None, None) => {}
    }

    let workflow = Workflow::new(SystemRunner, settings);
    if let Err(reason) = check_privileges(&workflow) {
        fail(&reason);
    }

    match mode {
        Some(kind) => run_once(&workflow, kind),
        None => crate::tui::run(Arc::new(workflow)),
    }
}

fn parse_cli() -> Cli {
    match Cli::try_parse_from(env::args()) {
        Ok(cli) => cli,
        Err(err) => {
            if err.kind() == ErrorKind::UnknownArgument {
                if let Some(arg) = err.context().find_map(|c| {
                    if let ContextKind::InvalidArg = c.0 {
                        Some(c.1.to_string())
                    } else {
                        None
                    }
                }) {
                    eprintln!("❌ unknown option: {}", arg);
                    eprintln!("{}", USAGE_HINT);
                    std::process::exit(1);
                }
            }
            eprintln!("{}", err.render());
            eprintln!("{}", USAGE_HINT);
            std::process::exit(1);
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("⚠️  {}", message);
    std::process::exit(1);
}

fn check_privileges(workflow: &Workflow<SystemRunner>) -> std::result::Result<(), String> {
    if workflow.settings().require_root && !is_root() {
        return Err(format!("must be run as root\n{}", PERMISSION_HINT));
    }
    if let Err(err) = workflow.check_permissions() {
        tracing::debug!("permission probe failed: {}", err);
        return Err(PERMISSION_HINT.to_string());
    }
    Ok(())
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Non-interactive run of a single operation; exits 1 on failure.
fn run_once(workflow: &Workflow<SystemRunner>, kind: OperationKind) -> Result<()> {
    let request = match kind {
        OperationKind::Backup => {
            println!("📦 Running incremental backup...");
            OperationRequest::Backup {
                secret: prompt_secret(workflow.settings())?,
            }
        }
        OperationKind::ForceBackup => {
            println!("🔥 Running force backup...");
            OperationRequest::ForceBackup {
                secret: prompt_secret(workflow.settings())?,
            }
        }
        OperationKind::Unmount => {
            println!("🔌 Unmounting backup disk...");
            OperationRequest::Unmount
        }
        OperationKind::Prepare => anyhow::bail!("prepare is only available from the menu"),
    };

    let result = workflow.execute(request);
    print!("{}", result.transcript);
    if let Outcome::Failure(message) = &result.outcome {
        eprintln!("❌ {} failed: {}", kind, message);
        std::process::exit(1);
    }
    Ok(())
}

/// Hidden prompt on a terminal. Without one (cron, ssh without a tty) the
/// secret is read as one line from stdin.
fn prompt_secret(settings: &Settings) -> Result<Secret> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        let secret = rpassword::prompt_password(format!(
            "Enter the encryption password for {}: ",
            settings.backup_pool
        ))
        .context("read password")?;
        return non_empty(Secret::new(secret));
    }
    read_secret(&mut stdin.lock())
}

fn read_secret(reader: &mut impl BufRead) -> Result<Secret> {
    let secret = rpassword::read_password_from_bufread(reader)
        .context("read password from stdin")?;
    non_empty(Secret::new(secret))
}

fn non_empty(secret: Secret) -> Result<Secret> {
    if secret.is_empty() {
        anyhow::bail!("password cannot be empty");
    }
    Ok(secret)
}

fn print_help() {
    println!("🗄️  ZFS Backup Management Tool {}", VERSION);
    println!();
    println!("Usage: zfs-backup [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -b, --backup          Run incremental backup");
    println!("  -f, --force-backup    Force backup (destructive)");
    println!("  -u, --unmount         Unmount and power off backup disk");
    println!("  --config <path>       Config file path (default /etc/zfs-backup.yaml)");
    println!("  -v, --verbose         Verbose logging");
    println!("  -h, --help            Show this help message");
    println!();
    println!("If no options are provided, an interactive TUI menu will be displayed.");
    println!();
    println!("Examples:");
    println!("  sudo zfs-backup              # Show interactive menu");
    println!("  sudo zfs-backup --backup     # Run incremental backup");
    println!("  sudo zfs-backup --unmount    # Unmount backup disk");
    println!();
    println!("Note: If you have ZFS delegation configured for your user, you can omit sudo.");
}

/// Stderr carries the printed transcript already, so it only gets warnings
/// unless `--verbose` is given. The log file records every step.
fn filter_directive(verbose: bool, to_file: bool) -> &'static str {
    match (verbose, to_file) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    }
}

/// Logs to `log_file` when given, stderr otherwise. The menu owns the
/// screen, so it only ever gets the file variant.
fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::new(filter_directive(verbose, log_file.is_some()));
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_logs_only_warnings_by_default() {
        assert_eq!(filter_directive(false, false), "warn");
        assert_eq!(filter_directive(true, false), "debug");
        assert_eq!(filter_directive(false, true), "info");
        assert_eq!(filter_directive(true, true), "debug");
    }

    #[test]
    fn piped_secret_is_one_line() {
        let mut input = io::Cursor::new(b"hunter2\nnext line\n".to_vec());
        assert_eq!(read_secret(&mut input).unwrap().expose(), "hunter2");

        let mut input = io::Cursor::new(b"pass word\r\n".to_vec());
        assert_eq!(read_secret(&mut input).unwrap().expose(), "pass word");
    }

    #[test]
    fn piped_empty_secret_is_rejected() {
        let mut input = io::Cursor::new(b"\n".to_vec());
        let err = read_secret(&mut input).unwrap_err();
        assert_eq!(err.to_string(), "password cannot be empty");
    }

    #[test]
    fn log_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zfs-backup.log");
        std::fs::write(&path, "previous\n").unwrap();
        init_tracing(false, Some(&path)).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("previous\n"));
    }
}
