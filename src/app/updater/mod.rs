//! Update orchestration
//!
//! The `Updater` ties the resolver, the release client, the current reference
//! and the ledger together. Each public method is one action of the tool:
//!
//! - `check`: compare local and remote versions without touching anything
//! - `update`: download and switch only when the remote version is newer
//! - `force`: delete the remote version's artifact and fetch it again
//! - `switch`: repoint the current reference at an artifact already on disk
//! - `list`: read the ledger
//!
//! Every state change is followed by a ledger append. A failed append is
//! logged and reported in the outcome but never fails the action.
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_cursor::app::{Updater, UpdateOutcome};
//! # use update_cursor::app::UpdaterSettings;
//!
//! # async fn example(settings: UpdaterSettings) -> update_cursor::errors::Result<()> {
//! let updater = Updater::new(settings)?;
//! match updater.update().await? {
//!     UpdateOutcome::AlreadyCurrent { remote, .. } => println!("Already on {}", remote),
//!     UpdateOutcome::Installed(report) => println!("Installed {}", report.version),
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::app::client::{DownloadOutcome, ReleaseClient};
use crate::app::hash::Sha256Digest;
use crate::app::ledger::{Ledger, LedgerAction, LedgerEntry};
use crate::app::progress::ProgressCallback;
use crate::app::resolver::{LocalVersion, VersionResolver};
use crate::app::version::Version;
use crate::errors::{LedgerResult, Result, SwitchError};

pub mod link;
pub mod settings;

pub use settings::UpdaterSettings;

/// Result of comparing the installed and the available version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub local: LocalVersion,
    pub remote: String,
    pub update_available: bool,
}

/// An artifact that became the current version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub version: String,
    pub file_name: String,
    pub path: PathBuf,
    pub digest: Sha256Digest,
    /// False when an artifact already on disk was reused
    pub downloaded: bool,
    /// False when the ledger append failed
    pub ledger_recorded: bool,
}

/// Result of the `update` action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Nothing was downloaded and nothing was recorded
    AlreadyCurrent { local: LocalVersion, remote: String },
    Installed(InstallReport),
}

/// Result of the `switch` action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub version: String,
    pub file_name: String,
    pub ledger_recorded: bool,
}

/// Version-state orchestrator
pub struct Updater {
    settings: UpdaterSettings,
    client: ReleaseClient,
    resolver: VersionResolver,
    ledger: Ledger,
    progress: Option<ProgressCallback>,
}

impl Updater {
    /// Create an updater with the default HTTP client
    ///
    /// # Errors
    ///
    /// Returns `AppError::Download` if the HTTP client cannot be built.
    pub fn new(settings: UpdaterSettings) -> Result<Self> {
        Ok(Self::with_client(settings, ReleaseClient::new()?))
    }

    /// Create an updater around an existing client
    pub fn with_client(settings: UpdaterSettings, client: ReleaseClient) -> Self {
        let resolver = VersionResolver::new(settings.pattern.clone(), settings.version_policy);
        let ledger = Ledger::new(settings.ledger_path.clone());
        Self {
            settings,
            client,
            resolver,
            ledger,
            progress: None,
        }
    }

    /// Receive progress updates while downloading
    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    pub fn settings(&self) -> &UpdaterSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Installed version, read from the current reference
    ///
    /// # Errors
    ///
    /// Returns `AppError::Resolve` if the reference exists but cannot be read.
    pub async fn local_version(&self) -> Result<LocalVersion> {
        Ok(self
            .resolver
            .local_version(&self.settings.current_link, &self.settings.download_dir)
            .await?)
    }

    /// Version the release URL currently points at
    ///
    /// # Errors
    ///
    /// Returns `AppError::Resolve` on request failure or an unversioned URL.
    pub async fn remote_version(&self) -> Result<String> {
        Ok(self
            .resolver
            .remote_version(&self.client, &self.settings.download_url)
            .await?)
    }

    /// Compare local and remote versions; mutates nothing
    ///
    /// # Errors
    ///
    /// Returns `AppError::Resolve` if either version cannot be determined, or
    /// a malformed version under the strict policy.
    pub async fn check(&self) -> Result<CheckReport> {
        let remote = self.remote_version().await?;
        let local = self.local_version().await?;
        let update_available = self.resolver.needs_update(&local, &remote)?;

        debug!(
            "Local {} / remote {} / update available: {}",
            local, remote, update_available
        );

        Ok(CheckReport {
            local,
            remote,
            update_available,
        })
    }

    /// Install the remote version if it is newer than the local one
    ///
    /// # Errors
    ///
    /// Returns resolution, transfer and switch failures. Ledger failures are
    /// only reflected in `InstallReport::ledger_recorded`.
    pub async fn update(&self) -> Result<UpdateOutcome> {
        let CheckReport {
            local,
            remote,
            update_available,
        } = self.check().await?;

        if !update_available {
            info!("Already up to date ({})", remote);
            return Ok(UpdateOutcome::AlreadyCurrent { local, remote });
        }

        info!("Updating {} -> {}", local, remote);
        let report = self.install(&remote, LedgerAction::Update).await?;
        Ok(UpdateOutcome::Installed(report))
    }

    /// Re-download the remote version unconditionally
    ///
    /// An existing artifact for that version is deleted first. Failing to
    /// delete it is only a warning.
    ///
    /// # Errors
    ///
    /// Returns resolution, transfer and switch failures.
    pub async fn force(&self) -> Result<InstallReport> {
        let remote = self.remote_version().await?;
        let path = self.settings.artifact_path(&remote);

        match fs::remove_file(&path).await {
            Ok(()) => info!("Removed existing artifact {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", path.display(), e),
        }

        self.install(&remote, LedgerAction::Force).await
    }

    /// Repoint the current reference at an artifact already on disk
    ///
    /// # Errors
    ///
    /// Returns `SwitchError::InvalidVersion` for a malformed version,
    /// `SwitchError::VersionNotFound` when no artifact exists for it, and
    /// `SwitchError::Io` when the reference cannot be replaced. No ledger entry
    /// is written on failure.
    pub async fn switch(&self, version: &str) -> Result<SwitchReport> {
        let version = Version::parse(version)
            .map_err(SwitchError::from)?
            .to_string();
        let file_name = self.settings.artifact_name(&version);
        let path = self.settings.artifact_path(&version);

        let exists = fs::try_exists(&path)
            .await
            .map_err(|source| SwitchError::Io {
                path: path.clone(),
                source,
            })?;
        if !exists {
            return Err(SwitchError::VersionNotFound { version, file_name }.into());
        }

        link::point_reference(&self.settings.current_link, &path).await?;
        self.write_marker(&version).await;
        info!("Switched to {}", version);

        // no bytes were read, so no digest
        let ledger_recorded = self
            .record(LedgerEntry::new(&version, &file_name, "", LedgerAction::Switch))
            .await;

        Ok(SwitchReport {
            version,
            file_name,
            ledger_recorded,
        })
    }

    /// Every well-formed ledger entry, oldest first
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Io` if the ledger exists but cannot be read.
    pub async fn list(&self) -> LedgerResult<Vec<LedgerEntry>> {
        self.ledger.read_all().await
    }

    /// Download (or reuse) the artifact for `version`, make it current and
    /// record `action`
    async fn install(&self, version: &str, action: LedgerAction) -> Result<InstallReport> {
        let file_name = self.settings.artifact_name(version);
        let path = self.settings.artifact_path(version);

        fs::create_dir_all(&self.settings.download_dir).await?;

        let outcome = self
            .client
            .download_file(&self.settings.download_url, &path, self.progress.as_ref())
            .await?;

        let (digest, downloaded) = match outcome {
            DownloadOutcome::Downloaded { digest, .. } => (digest, true),
            DownloadOutcome::AlreadyPresent => (Sha256Digest::of_file(&path).await?, false),
        };

        link::point_reference(&self.settings.current_link, &path).await?;
        self.write_marker(version).await;

        let ledger_recorded = self
            .record(LedgerEntry::new(version, &file_name, digest.to_hex(), action))
            .await;

        info!("{} is now current ({})", file_name, digest);

        Ok(InstallReport {
            version: version.to_string(),
            file_name,
            path,
            digest,
            downloaded,
            ledger_recorded,
        })
    }

    async fn write_marker(&self, version: &str) {
        let marker = self.settings.version_file();
        if let Err(e) = link::write_version_marker(&marker, version).await {
            warn!("Failed to update version file {}: {}", marker.display(), e);
        }
    }

    async fn record(&self, entry: LedgerEntry) -> bool {
        match self.ledger.append(&entry).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Failed to record {} of {} in ledger {}: {}",
                    entry.action,
                    entry.version,
                    self.ledger.path().display(),
                    e
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("settings", &self.settings)
            .field("ledger", &self.ledger)
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}
