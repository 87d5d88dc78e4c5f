//! Three-component version model
//!
//! Versions are extracted from artifact file names and ordered component-wise.
//! Parsing is strict: anything other than exactly three dot-separated base-10
//! integers is rejected rather than coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{VersionError, VersionResult};

/// A `major.minor.patch` version
///
/// Ordering is lexicographic on `(major, minor, patch)`, which the derived
/// `Ord` gives us through field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a version from its components
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string
    ///
    /// # Errors
    ///
    /// Returns `VersionError::Invalid` unless the input is exactly three
    /// dot-separated, non-empty runs of ASCII digits.
    pub fn parse(input: &str) -> VersionResult<Self> {
        let invalid = |reason: String| VersionError::Invalid {
            input: input.to_string(),
            reason,
        };

        if input.is_empty() {
            return Err(invalid("empty version string".to_string()));
        }

        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid(format!("expected 3 parts, got {}", parts.len())));
        }

        let mut components = [0u64; 3];
        for (slot, (part, name)) in components
            .iter_mut()
            .zip(parts.iter().zip(["major", "minor", "patch"]))
        {
            // u64::from_str would accept a leading '+'
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(format!("invalid {} component '{}'", name, part)));
            }
            *slot = part
                .parse()
                .map_err(|e| invalid(format!("invalid {} component: {}", name, e)))?;
        }

        Ok(Self::new(components[0], components[1], components[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// How to treat a version that cannot be parsed when deciding on an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionPolicy {
    /// Malformed operands never trigger an update
    #[default]
    NoUpdate,
    /// Malformed operands are reported as an error
    Error,
}

/// Returns true when `older` parses, `newer` parses, and `older < newer`
///
/// Either side failing to parse yields `false`, so a malformed version never
/// triggers an update on its own.
pub fn is_older_than(older: &str, newer: &str) -> bool {
    match (Version::parse(older), Version::parse(newer)) {
        (Ok(a), Ok(b)) => a < b,
        _ => false,
    }
}
