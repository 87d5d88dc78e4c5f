//! Artifact naming pattern
//!
//! A pattern such as `Cursor-<version>-x86_64.AppImage` is used in both
//! directions: to build the file name for a version, and to pull the version
//! back out of a file name or URL basename.

use std::fmt;

use crate::constants::VERSION_PLACEHOLDER;
use crate::errors::{VersionError, VersionResult};

/// A file name pattern with a single `<version>` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPattern {
    prefix: String,
    suffix: String,
}

impl ArtifactPattern {
    /// Parse a naming pattern
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidPattern` unless the pattern contains the
    /// placeholder exactly once.
    pub fn new(pattern: &str) -> VersionResult<Self> {
        let count = pattern.matches(VERSION_PLACEHOLDER).count();
        if count != 1 {
            return Err(VersionError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: format!(
                    "expected exactly one {} placeholder, found {}",
                    VERSION_PLACEHOLDER, count
                ),
            });
        }

        let (prefix, suffix) = pattern
            .split_once(VERSION_PLACEHOLDER)
            .unwrap_or((pattern, ""));

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Build the artifact file name for a version
    pub fn file_name(&self, version: &str) -> String {
        format!("{}{}{}", self.prefix, version, self.suffix)
    }

    /// Extract the version substring from an artifact file name
    ///
    /// The literal text around the placeholder must match exactly and the
    /// middle must be one or more dot-separated digit runs (`1.4`, `1.4.5`,
    /// `1.4.5.2` all qualify). Returns `None` otherwise.
    pub fn extract_version<'a>(&self, name: &'a str) -> Option<&'a str> {
        let candidate = name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;

        if is_dotted_numeric(candidate) {
            Some(candidate)
        } else {
            None
        }
    }

    /// True when the file name follows this pattern
    pub fn matches(&self, name: &str) -> bool {
        self.extract_version(name).is_some()
    }
}

impl fmt::Display for ArtifactPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, VERSION_PLACEHOLDER, self.suffix)
    }
}

/// `[0-9]+(\.[0-9]+)*`
fn is_dotted_numeric(s: &str) -> bool {
    !s.is_empty()
        && s
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}
