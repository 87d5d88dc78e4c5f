//! Command-line argument parsing for Update Cursor
//!
//! This module defines the CLI structure using clap derive macros. Running
//! without a subcommand is the same as `update`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Update Cursor - keep the Cursor AppImage current
#[derive(Parser, Debug)]
#[command(
    name = "update_cursor",
    version,
    about = "Download, switch and audit Cursor AppImage versions",
    long_about = "Keeps a symlink pointing at the newest Cursor AppImage.
Versions are discovered by following the release URL's redirects, downloads are
written atomically, and every change is recorded in an append-only ledger.

Exit codes: 0 success, 10 update available (check), 1 failure."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands (default: update)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Compare the installed version with the latest release (exit 10 if newer)
    Check,

    /// Download the latest release if it is newer and make it current
    Update,

    /// Re-download the latest release even if it is already installed
    Force,

    /// Show the version history ledger
    List,

    /// Make an already downloaded version current
    Switch(SwitchArgs),
}

/// Arguments for the switch command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SwitchArgs {
    /// Version to switch to, e.g. 1.4.5
    #[arg(value_name = "VERSION")]
    pub version: String,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to run, `update` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Update)
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
