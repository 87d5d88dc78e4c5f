//! Core application logic for Update Cursor
//!
//! This module contains the version model, the audit ledger, the HTTP client,
//! the version resolver and the orchestrator that ties them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use update_cursor::app::{ArtifactPattern, Ledger};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pattern = ArtifactPattern::new("Cursor-<version>-x86_64.AppImage")?;
//! assert_eq!(pattern.extract_version("Cursor-1.4.5-x86_64.AppImage"), Some("1.4.5"));
//!
//! let ledger = Ledger::new("/tmp/cursor-versions.log");
//! for entry in ledger.read_all().await? {
//!     println!("{} {} {}", entry.timestamp, entry.version, entry.action);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod hash;
pub mod ledger;
pub mod pattern;
pub mod progress;
pub mod resolver;
pub mod updater;
pub mod version;

// Re-export main public API
pub use client::{ClientConfig, DownloadOutcome, ReleaseClient};
pub use hash::Sha256Digest;
pub use ledger::{Ledger, LedgerAction, LedgerEntry};
pub use pattern::ArtifactPattern;
pub use progress::{ProgressCallback, ProgressUpdate};
pub use resolver::{LocalVersion, VersionResolver};
pub use updater::{
    CheckReport, InstallReport, SwitchReport, UpdateOutcome, Updater, UpdaterSettings,
};
pub use version::{is_older_than, Version, VersionPolicy};
