//! Simsh CLI - Command line front end for simulated shell sessions
//!
//! Usage:
//!   simsh -c 'ls -la'              # Execute one command line
//!   simsh commands.txt             # Execute a file, one command per line
//!   simsh --json                   # JSON-lines session protocol on stdin/stdout
//!   simsh                          # Interactive REPL

mod repl;
mod transport;

use anyhow::{Context, Result};
use clap::Parser;
use simsh::{CLEAR_SCREEN, CommandResult, Isolation, Shell};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Simsh - Simulated Unix shell over a virtual filesystem
#[derive(Parser, Debug)]
#[command(name = "simsh")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execute the given command line(s), one per line
    #[arg(short = 'c')]
    command: Option<String>,

    /// File of commands to execute, one per line
    #[arg()]
    script: Option<PathBuf>,

    /// Speak the JSON-lines session protocol on stdin/stdout
    #[arg(long, conflicts_with_all = ["command", "script"])]
    json: bool,

    /// Give every session its own namespace
    #[arg(long)]
    isolated: bool,

    /// Simulated hostname
    #[arg(long)]
    hostname: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let hostname = args
        .hostname
        .unwrap_or_else(|| simsh::DEFAULT_HOSTNAME.to_string());
    let mut builder = Shell::builder().hostname(hostname.clone());
    if args.isolated {
        builder = builder.isolation(Isolation::PerSession);
    }
    let shell = builder.build();

    if args.json {
        return transport::run(&shell).await;
    }

    // Execute command string if provided
    if let Some(cmd) = args.command {
        let success = run_lines(&shell, &cmd).await?;
        std::process::exit(if success { 0 } else { 1 });
    }

    // Execute command file if provided
    if let Some(script_path) = args.script {
        let script = std::fs::read_to_string(&script_path)
            .with_context(|| format!("Failed to read script: {}", script_path.display()))?;
        let success = run_lines(&shell, &script).await?;
        std::process::exit(if success { 0 } else { 1 });
    }

    repl::run(&shell, &hostname).await
}

fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")?;
    Ok(())
}

/// Run each non-empty, non-comment line in one session. Reports whether
/// the last command succeeded.
async fn run_lines(shell: &Shell, text: &str) -> Result<bool> {
    let session = shell.create_session();
    let mut success = true;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let result = shell
            .execute(session, line)
            .await
            .context("Failed to execute command")?;
        print_result(&result);
        success = result.success;
    }
    Ok(success)
}

/// Write a result the way a terminal would show it.
pub(crate) fn print_result(result: &CommandResult) {
    if result.output == CLEAR_SCREEN {
        print!("{}", CLEAR_SCREEN);
        return;
    }
    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    if let Some(error) = &result.error {
        if result.output.is_empty() || !result.output.contains(error.as_str()) {
            eprintln!("{}", error);
        }
    }
}
