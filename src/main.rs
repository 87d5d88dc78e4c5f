//! Update Cursor CLI application
//!
//! Command-line interface for keeping the Cursor AppImage up to date.
//! Exits with 10 when `check` finds a newer version and 1 on any failure.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use update_cursor::cli::{build_updater, dispatch, Cli};
use update_cursor::errors::{AppError, Result};

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        // the check command already reported an available update
        if !matches!(e, AppError::UpdateAvailable { .. }) {
            debug!("Failed with {} error", e.category());
            eprintln!("Error: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
        }
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    init_logging(&cli)?;

    info!("Update Cursor v{} starting", env!("CARGO_PKG_VERSION"));

    let command = cli.command();
    info!("Executing {:?} command", command);

    let updater = build_updater(&cli.global).await?;
    dispatch(command, updater, &cli.global).await
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = cli.log_level();

    let directive = format!("update_cursor={}", log_level)
        .parse()
        .map_err(|e| AppError::generic(format!("Invalid log directive: {}", e)))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }

    Ok(())
}
