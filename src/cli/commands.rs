//! Command handlers for Update Cursor CLI
//!
//! This module implements the command handlers that connect parsed arguments
//! and configuration to the `Updater`. Results go to stdout; warnings and
//! progress go to stderr.

use tracing::{debug, info};

use crate::app::{LedgerEntry, ReleaseClient, UpdateOutcome, Updater};
use crate::cli::{Commands, DownloadProgress, GlobalArgs};
use crate::config::AppConfig;
use crate::constants::ledger::SHORT_DIGEST_LEN;
use crate::errors::{AppError, Result};

/// Load configuration and build the updater
///
/// Without an explicit `--config`, a commented default file is created on
/// first run.
pub async fn build_updater(global: &GlobalArgs) -> Result<Updater> {
    if global.config.is_none() {
        if let Some(path) = AppConfig::initialize_first_run().await? {
            if !global.quiet {
                eprintln!("Created default configuration file:");
                eprintln!("   {}", path.display());
                eprintln!("   You can customize settings by editing this file.");
                eprintln!();
            }
        }
    }

    let config = AppConfig::load(global.config.clone()).await?;
    let settings = config.to_settings()?;
    debug!("Resolved settings: {:?}", settings);

    let client = ReleaseClient::with_config(&config.client.to_runtime_config())?;
    Ok(Updater::with_client(settings, client))
}

/// Run one command against a ready updater
pub async fn dispatch(command: Commands, updater: Updater, global: &GlobalArgs) -> Result<()> {
    match command {
        Commands::Check => handle_check(&updater).await,
        Commands::Update => handle_update(updater, global).await,
        Commands::Force => handle_force(updater, global).await,
        Commands::List => handle_list(&updater).await,
        Commands::Switch(args) => handle_switch(&updater, &args.version).await,
    }
}

/// Handle the check command
///
/// Returns `AppError::UpdateAvailable` when the remote version is newer, so
/// the process can exit with its dedicated code.
pub async fn handle_check(updater: &Updater) -> Result<()> {
    let report = updater.check().await?;

    println!("Local: {}", report.local);
    println!("Remote: {}", report.remote);

    if report.update_available {
        println!();
        println!("Update needed: local version is older than remote version");
        return Err(AppError::UpdateAvailable {
            local: report.local.to_string(),
            remote: report.remote,
        });
    }

    println!();
    println!("No update needed: you have the latest version");
    Ok(())
}

/// Handle the update command
pub async fn handle_update(mut updater: Updater, global: &GlobalArgs) -> Result<()> {
    let progress = DownloadProgress::new(!global.quiet)?;
    updater.set_progress_callback(progress.callback());

    let outcome = updater.update().await;
    progress.finish();

    match outcome? {
        UpdateOutcome::AlreadyCurrent { local, .. } => {
            println!("Already up to date ({}).", local);
        }
        UpdateOutcome::Installed(report) => {
            info!("Installed {} at {}", report.file_name, report.path.display());
            println!("Updated to version {}", report.version);
        }
    }
    Ok(())
}

/// Handle the force command
pub async fn handle_force(mut updater: Updater, global: &GlobalArgs) -> Result<()> {
    let progress = DownloadProgress::new(!global.quiet)?;
    updater.set_progress_callback(progress.callback());

    let outcome = updater.force().await;
    progress.finish();

    let report = outcome?;
    println!("Force updated to version {}", report.version);
    Ok(())
}

/// Handle the list command
pub async fn handle_list(updater: &Updater) -> Result<()> {
    let entries = updater.list().await?;
    print!("{}", render_ledger(&entries));
    Ok(())
}

/// Handle the switch command
pub async fn handle_switch(updater: &Updater, version: &str) -> Result<()> {
    let report = updater.switch(version).await?;
    println!("Switched to version {}", report.version);
    Ok(())
}

/// Ledger as a table with a header row
pub fn render_ledger(entries: &[LedgerEntry]) -> String {
    if entries.is_empty() {
        return "No ledger entries found.\n".to_string();
    }

    let mut out = format_row(
        "when(UTC)",
        "ver",
        "internal",
        "file",
        "sha256 (short)",
        "action",
    );

    for entry in entries {
        let digest: String = entry.digest.chars().take(SHORT_DIGEST_LEN).collect();
        out.push_str(&format_row(
            &entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            &entry.version,
            &entry.correlation_id,
            &entry.file_name,
            &digest,
            entry.action.as_str(),
        ));
    }

    out
}

fn format_row(when: &str, ver: &str, internal: &str, file: &str, digest: &str, action: &str) -> String {
    format!(
        "{:<24}\t{:<7}\t{:<8}\t{:<30}\t{:<12}\t{}\n",
        when, ver, internal, file, digest, action
    )
}
