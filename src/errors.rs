//! Error types for Update Cursor
//!
//! This module defines the error types for every component of the updater.
//! Each concern has its own enum so callers can tell a missing artifact apart
//! from a network failure or an empty ledger, and `AppError` ties them together
//! for the command-line layer.

use std::path::PathBuf;

use thiserror::Error;

/// Version parsing and naming-pattern errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// String is not exactly three dot-separated non-negative integers
    #[error("Invalid version '{input}': {reason}")]
    Invalid { input: String, reason: String },

    /// Naming pattern does not contain exactly one placeholder
    #[error("Invalid file name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Audit ledger errors
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The ledger directory could not be created
    #[error("Failed to create ledger directory: {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger file could not be opened, written or read
    #[error("Ledger I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger holds no entries
    #[error("No entries found in ledger")]
    Empty,
}

/// Local and remote version resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// HTTP request failed while following the release URL
    #[error("Failed to resolve remote version")]
    Http(#[from] reqwest::Error),

    /// The final URL after redirects carries no recognizable version
    #[error("Could not extract version from URL: {url}")]
    VersionNotInUrl { url: String },

    /// A version string could not be compared under the strict policy
    #[error("Malformed version '{version}' cannot be compared")]
    MalformedVersion { version: String },

    /// Inspecting the current reference or the download directory failed
    #[error("Failed to inspect {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Download and HTTP transfer errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Server returned a non-success status
    #[error("Download failed with status: HTTP {status}")]
    ServerError { status: u16 },

    /// Redirect response without a usable Location header
    #[error("Redirect location not found in response from {url}")]
    MissingLocation { url: String },

    /// Location header could not be turned into a URL
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Body ended before the announced length
    #[error("Incomplete download: received {received} bytes, expected {expected} bytes")]
    IncompleteDownload { received: u64, expected: u64 },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Current-reference switch errors
#[derive(Error, Debug)]
pub enum SwitchError {
    /// Target version does not parse
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    /// No artifact exists on disk for the requested version
    #[error("Version file not found: {file_name}")]
    VersionNotFound { version: String, file_name: String },

    /// Removing the old reference or creating the new link failed
    #[error("Failed to update current reference {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read or written
    #[error("Configuration file I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Home or config directory could not be determined
    #[error("Could not determine the user {which} directory")]
    NoDirectory { which: &'static str },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Version error
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Ledger error
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Resolution error
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Switch error
    #[error(transparent)]
    Switch(#[from] SwitchError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A newer version is available (result of `check`, not a failure)
    #[error("Update needed: local {local} is older than remote {remote}")]
    UpdateAvailable { local: String, remote: String },

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Process exit code for this error
    ///
    /// `UpdateAvailable` gets its own code so scripts can tell "newer version
    /// exists" apart from a real failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::UpdateAvailable { .. } => crate::constants::exit::UPDATE_AVAILABLE,
            _ => crate::constants::exit::FAILURE,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Version(_) => "version",
            AppError::Ledger(_) => "ledger",
            AppError::Resolve(_) => "resolution",
            AppError::Download(_) => "download",
            AppError::Switch(_) => "switch",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::UpdateAvailable { .. } => "update-available",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Version result type alias
pub type VersionResult<T> = std::result::Result<T, VersionError>;

/// Ledger result type alias
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Resolution result type alias
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Switch result type alias
pub type SwitchResult<T> = std::result::Result<T, SwitchError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
