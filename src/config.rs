//! Configuration management for Update Cursor
//!
//! This module provides configuration loading with automatic first-run
//! initialization and zero-config defaults. The TOML file is read once and
//! turned into `UpdaterSettings`, so nothing downstream has to know whether a
//! value came from the file or from a default.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::{ArtifactPattern, ClientConfig, UpdaterSettings, VersionPolicy};
use crate::constants::{config as config_consts, defaults, http, naming};
use crate::errors::{ConfigError, ConfigResult};

/// Application configuration as stored in TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Release URL that redirects to the versioned artifact
    pub download_url: String,
    /// Directory holding downloaded artifacts
    pub download_dir: PathBuf,
    /// Artifact naming pattern with a single `<version>` placeholder
    pub file_name_pattern: String,
    /// The "current version" symlink
    pub latest_symlink: PathBuf,
    /// Append-only audit ledger
    pub ledger_path: PathBuf,
    /// How versions that do not parse are compared
    pub version_policy: VersionPolicy,
    /// HTTP client settings
    pub client: ClientConfigToml,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_url: defaults::DOWNLOAD_URL.to_string(),
            download_dir: PathBuf::from(defaults::DOWNLOAD_DIR),
            file_name_pattern: defaults::FILE_NAME_PATTERN.to_string(),
            latest_symlink: PathBuf::from(defaults::LATEST_SYMLINK),
            ledger_path: PathBuf::from(defaults::LEDGER_PATH),
            version_policy: VersionPolicy::default(),
            client: ClientConfigToml::default(),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Request timeout in seconds (None = transport default)
    pub request_timeout_secs: Option<u64>,
    /// Connect timeout in seconds (None = transport default)
    pub connect_timeout_secs: Option<u64>,
    /// Redirect hops followed when resolving the remote version
    pub max_redirects: usize,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            connect_timeout_secs: None,
            max_redirects: http::MAX_REDIRECTS,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            max_redirects: self.max_redirects,
            ..Default::default()
        }
    }
}

impl AppConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// when present and built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when an explicit file is missing or any file
    /// cannot be read or parsed.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        if let Some(path) = config_file_override {
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Err(ConfigError::NotFound { path });
            }
            return Self::load_from_file(&path).await;
        }

        let path = Self::default_config_path()?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from_file(&path).await
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Initialize configuration on first run
    ///
    /// Writes the commented default file to the default location if nothing
    /// is there yet. Returns the path when a file was created.
    pub async fn initialize_first_run() -> ConfigResult<Option<PathBuf>> {
        let config_path = Self::default_config_path()?;
        if Self::initialize_at(&config_path).await? {
            Ok(Some(config_path))
        } else {
            Ok(None)
        }
    }

    /// Write the default file to `config_path` unless it exists; true if written
    pub async fn initialize_at(config_path: &Path) -> ConfigResult<bool> {
        if tokio::fs::try_exists(config_path).await.unwrap_or(false) {
            return Ok(false);
        }

        info!("Creating default configuration file...");

        let io_err = |path: &Path, source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(parent, e))?;
        }

        tokio::fs::write(config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| io_err(config_path, e))?;

        Ok(true)
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirectory { which: "config" })?;

        Ok(config_dir
            .join(config_consts::APP_DIR_NAME)
            .join(config_consts::FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Check every value before use
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.download_url.trim().is_empty() {
            return Err(invalid("download_url", "", "must not be empty"));
        }

        for (field, path) in [
            ("download_dir", &self.download_dir),
            ("latest_symlink", &self.latest_symlink),
            ("ledger_path", &self.ledger_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(invalid(field, "", "must not be empty"));
            }
        }

        let placeholders = self.file_name_pattern.matches(naming::VERSION_PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(invalid(
                "file_name_pattern",
                &self.file_name_pattern,
                &format!(
                    "must contain exactly one {} placeholder",
                    naming::VERSION_PLACEHOLDER
                ),
            ));
        }

        if self.client.max_redirects == 0 {
            return Err(invalid(
                "client.max_redirects",
                "0",
                "the release URL must be allowed to redirect",
            ));
        }

        Ok(())
    }

    /// Validate, expand `~` and parse into runtime settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for invalid values or an unknown home directory.
    pub fn to_settings(&self) -> ConfigResult<UpdaterSettings> {
        self.validate()?;

        let download_url = Url::parse(&self.download_url)
            .map_err(|e| invalid("download_url", &self.download_url, &e.to_string()))?;

        let pattern = ArtifactPattern::new(&self.file_name_pattern)
            .map_err(|e| invalid("file_name_pattern", &self.file_name_pattern, &e.to_string()))?;

        Ok(UpdaterSettings {
            download_url,
            download_dir: expand_home(&self.download_dir)?,
            pattern,
            current_link: expand_home(&self.latest_symlink)?,
            ledger_path: expand_home(&self.ledger_path)?,
            version_policy: self.version_policy,
        })
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Update Cursor Configuration
# This file was automatically generated on first run.
# Paths starting with ~ are expanded to your home directory.

# Release URL; it redirects to the versioned AppImage
download_url = "{url}"

# Where downloaded versions are kept
download_dir = "{dir}"

# Artifact file name; must contain {placeholder} exactly once
file_name_pattern = "{pattern}"

# Symlink pointing at the active version
latest_symlink = "{link}"

# Append-only history of downloads and switches
ledger_path = "{ledger}"

# What to do when a version cannot be compared:
# "no-update" keeps the current version, "error" aborts
version_policy = "no-update"

[client]
# Timeouts in seconds; leave unset for the transport defaults
# request_timeout_secs = 600
# connect_timeout_secs = 30
max_redirects = {redirects}
"#,
            url = defaults::DOWNLOAD_URL,
            dir = defaults::DOWNLOAD_DIR,
            placeholder = naming::VERSION_PLACEHOLDER,
            pattern = defaults::FILE_NAME_PATTERN,
            link = defaults::LATEST_SYMLINK,
            ledger = defaults::LEDGER_PATH,
            redirects = http::MAX_REDIRECTS,
        )
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Replace a leading `~` component with the home directory
///
/// # Errors
///
/// Returns `ConfigError::NoDirectory` if the path needs the home directory
/// and it cannot be determined.
pub fn expand_home(path: &Path) -> ConfigResult<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = dirs::home_dir().ok_or(ConfigError::NoDirectory { which: "home" })?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(path.to_path_buf()),
    }
}
