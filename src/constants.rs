//! Application constants for Update Cursor
//!
//! This module centralizes the constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Defaults applied when the configuration file leaves a key out
pub mod defaults {
    /// Release URL that redirects to the versioned artifact
    pub const DOWNLOAD_URL: &str = "https://www.cursor.com/download/stable/linux-x64";

    /// Directory holding downloaded artifacts
    pub const DOWNLOAD_DIR: &str = "~/Downloads/Cursor";

    /// Artifact naming pattern
    pub const FILE_NAME_PATTERN: &str = "Cursor-<version>-x86_64.AppImage";

    /// The "current version" symlink
    pub const LATEST_SYMLINK: &str = "~/Downloads/Cursor/Cursor.AppImage";

    /// Append-only audit ledger
    pub const LEDGER_PATH: &str = "~/.config/updateCursor/cursor-versions.log";
}

/// Configuration file locations
pub mod config {
    /// Directory name under the user config directory
    pub const APP_DIR_NAME: &str = "update-cursor";

    /// Configuration file name
    pub const FILE_NAME: &str = "config.toml";
}

/// Artifact naming
pub mod naming {
    /// Placeholder substituted with the version in the file name pattern
    pub const VERSION_PLACEHOLDER: &str = "<version>";
}

/// HTTP client configuration constants
pub mod http {
    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("update-cursor/", env!("CARGO_PKG_VERSION"));

    /// Maximum number of redirects followed while resolving the remote version
    pub const MAX_REDIRECTS: usize = 10;
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic downloads
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Marker file written next to the artifacts, holding `VERSION=<v>`
    pub const VERSION_FILE_NAME: &str = ".cursor-version";

    /// Permissions applied to a finished artifact (Unix only)
    #[cfg(unix)]
    pub const ARTIFACT_PERMISSIONS: u32 = 0o755;

    /// Buffer size used when hashing files from disk
    pub const HASH_BUFFER_SIZE: usize = 64 * 1024;
}

/// Progress reporting
pub mod progress {
    use super::Duration;

    /// Minimum interval between two progress callbacks
    pub const UPDATE_INTERVAL: Duration = Duration::from_millis(100);
}

/// Ledger file format
pub mod ledger {
    /// Field separator
    pub const SEPARATOR: char = '\t';

    /// Number of fields per line
    pub const FIELD_COUNT: usize = 6;

    /// Digest characters shown by `list`
    pub const SHORT_DIGEST_LEN: usize = 12;
}

/// Process exit codes
pub mod exit {
    /// Generic failure
    pub const FAILURE: i32 = 1;

    /// `check` found a newer remote version
    pub const UPDATE_AVAILABLE: i32 = 10;
}

// Re-export commonly used constants at the top level
pub use http::USER_AGENT;
pub use naming::VERSION_PLACEHOLDER;
