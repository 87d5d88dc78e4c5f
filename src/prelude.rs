//! Prelude module for Update Cursor Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use update_cursor::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use update_cursor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = AppConfig::load(None).await?.to_settings()?;
//!     let updater = Updater::new(settings)?;
//!
//!     let report = updater.check().await?;
//!     println!("{} -> {}", report.local, report.remote);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    ArtifactPattern,
    // Result and status types
    CheckReport,
    ClientConfig,
    InstallReport,
    // Ledger
    Ledger,
    LedgerAction,
    LedgerEntry,
    LocalVersion,
    ProgressCallback,
    ProgressUpdate,
    ReleaseClient,
    Sha256Digest,
    SwitchReport,
    UpdateOutcome,
    // Core orchestration
    Updater,
    UpdaterSettings,
    // Version model
    Version,
    VersionPolicy,
};

// Configuration
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{USER_AGENT, VERSION_PLACEHOLDER};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};

// Common external crate re-exports for convenience
pub use tokio;
