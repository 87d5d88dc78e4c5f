//! Append-only audit ledger
//!
//! Every state transition (download, update, force, switch) is recorded as one
//! line of six tab-separated fields:
//!
//! ```text
//! timestamp(RFC 3339, UTC)\tversion\tcorrelation id\tfile name\tdigest hex\taction
//! ```
//!
//! Lines are only ever appended. Reading trims surrounding whitespace and skips
//! lines that are not UTF-8, do not have exactly six fields, or whose timestamp
//! does not parse, so a partially corrupted file still yields its valid entries.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::constants::ledger::{FIELD_COUNT, SEPARATOR};
use crate::errors::{LedgerError, LedgerResult};

/// Action tag of a ledger entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerAction {
    Download,
    Update,
    Force,
    Switch,
    /// Tag written by some other tool; kept verbatim
    Other(String),
}

impl LedgerAction {
    /// Tag as written to the ledger
    pub fn as_str(&self) -> &str {
        match self {
            LedgerAction::Download => "download",
            LedgerAction::Update => "update",
            LedgerAction::Force => "force",
            LedgerAction::Switch => "switch",
            LedgerAction::Other(tag) => tag,
        }
    }
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for LedgerAction {
    fn from(tag: &str) -> Self {
        match tag {
            "download" => LedgerAction::Download,
            "update" => LedgerAction::Update,
            "force" => LedgerAction::Force,
            "switch" => LedgerAction::Switch,
            other => LedgerAction::Other(other.to_string()),
        }
    }
}

/// One recorded state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// UTC, second precision
    pub timestamp: DateTime<Utc>,
    pub version: String,
    /// Opaque external identifier; empty when unknown
    pub correlation_id: String,
    pub file_name: String,
    /// Hex content digest; empty when no bytes were read
    pub digest: String,
    pub action: LedgerAction,
}

impl LedgerEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        version: impl Into<String>,
        file_name: impl Into<String>,
        digest: impl Into<String>,
        action: LedgerAction,
    ) -> Self {
        Self {
            timestamp: Utc::now().trunc_subsecs(0),
            version: version.into(),
            correlation_id: String::new(),
            file_name: file_name.into(),
            digest: digest.into(),
            action,
        }
    }

    /// Replace the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp.trunc_subsecs(0);
        self
    }

    /// Attach a correlation id
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = id.into();
        self
    }

    /// Render as a ledger line, newline included
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            sanitize(&self.version),
            sanitize(&self.correlation_id),
            sanitize(&self.file_name),
            sanitize(&self.digest),
            sanitize(self.action.as_str()),
        )
    }

    /// Parse a ledger line; `None` for malformed lines
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return None;
        }

        let timestamp = DateTime::parse_from_rfc3339(fields[0])
            .ok()?
            .with_timezone(&Utc);

        Some(Self {
            timestamp,
            version: fields[1].to_string(),
            correlation_id: fields[2].to_string(),
            file_name: fields[3].to_string(),
            digest: fields[4].to_string(),
            action: LedgerAction::from(fields[5]),
        })
    }
}

/// Separators inside a field would break the line format
fn sanitize(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

/// The ledger file
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Create a ledger handle for the given file; nothing is touched on disk
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, creating the parent directory if needed
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::CreateDirectory` or `LedgerError::Io` when the
    /// directory cannot be created or the file cannot be opened or written.
    pub async fn append(&self, entry: &LedgerEntry) -> LedgerResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| LedgerError::CreateDirectory {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        let io_err = |source: std::io::Error| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;

        // one write per line keeps concurrent appends from interleaving mid-line
        file.write_all(entry.to_line().as_bytes())
            .await
            .map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        debug!(
            "Appended {} entry for {} to {}",
            entry.action,
            entry.version,
            self.path.display()
        );
        Ok(())
    }

    /// Read every well-formed entry in file order
    ///
    /// A missing ledger file is an empty ledger, not an error.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Io` if the file exists but cannot be read.
    pub async fn read_all(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let io_err = |source: std::io::Error| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        let file = match fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut entries = Vec::new();
        let mut skipped = 0usize;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await.map_err(io_err)? == 0 {
                break;
            }

            // lines are raw bytes; invalid UTF-8 is just another malformed line
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            match LedgerEntry::parse_line(line) {
                Some(entry) => entries.push(entry),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(
                "Skipped {} malformed line(s) in {}",
                skipped,
                self.path.display()
            );
        }

        Ok(entries)
    }

    /// All entries carrying the given correlation id
    pub async fn find_by_correlation_id(&self, id: &str) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|entry| entry.correlation_id == id)
            .collect())
    }

    /// The entry with the latest timestamp
    ///
    /// On equal timestamps the earliest line wins.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Empty` when the ledger has no entries, distinct
    /// from the `LedgerError::Io` raised when it cannot be read.
    pub async fn latest(&self) -> LedgerResult<LedgerEntry> {
        self.read_all()
            .await?
            .into_iter()
            .reduce(|best, entry| {
                if entry.timestamp > best.timestamp {
                    entry
                } else {
                    best
                }
            })
            .ok_or(LedgerError::Empty)
    }
}
