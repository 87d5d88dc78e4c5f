//! Local and remote version resolution
//!
//! The remote version is whatever the release URL finally redirects to. The
//! local version is read from the current reference: from its link target
//! when it is a symlink, or, when it is a plain copy, by finding artifacts of
//! the same byte size in the download directory.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};
use url::Url;

use crate::app::client::ReleaseClient;
use crate::app::pattern::ArtifactPattern;
use crate::app::version::{Version, VersionPolicy};
use crate::errors::{ResolveError, ResolveResult};

/// What the current reference says about the installed version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalVersion {
    /// Nothing exists at the current-reference path
    Absent,
    /// Something exists but no version could be attributed to it
    Unrecognized,
    /// A single version was identified
    Installed(String),
    /// A plain-file reference matched several artifacts by size; highest
    /// version first
    Ambiguous(Vec<String>),
}

impl LocalVersion {
    /// The version used for update decisions, if any
    ///
    /// For an ambiguous match this is the highest candidate.
    pub fn version(&self) -> Option<&str> {
        match self {
            LocalVersion::Installed(version) => Some(version),
            LocalVersion::Ambiguous(candidates) => candidates.first().map(String::as_str),
            LocalVersion::Absent | LocalVersion::Unrecognized => None,
        }
    }

    /// True when no version could be attributed
    pub fn is_unknown(&self) -> bool {
        self.version().is_none()
    }
}

impl fmt::Display for LocalVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalVersion::Absent | LocalVersion::Unrecognized => f.write_str("(unknown)"),
            LocalVersion::Installed(version) => f.write_str(version),
            LocalVersion::Ambiguous(candidates) => write!(
                f,
                "{} (ambiguous: {})",
                self.version().unwrap_or("(unknown)"),
                candidates.join(", ")
            ),
        }
    }
}

/// Resolves installed and available versions
#[derive(Debug, Clone)]
pub struct VersionResolver {
    pattern: ArtifactPattern,
    policy: VersionPolicy,
}

impl VersionResolver {
    /// Create a resolver for artifacts named by `pattern`
    pub fn new(pattern: ArtifactPattern, policy: VersionPolicy) -> Self {
        Self { pattern, policy }
    }

    /// The naming pattern in use
    pub fn pattern(&self) -> &ArtifactPattern {
        &self.pattern
    }

    /// Follow `download_url` through every redirect and read the version off
    /// the final URL's file name
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Http` when the request fails and
    /// `ResolveError::VersionNotInUrl` when the final name does not follow the
    /// naming pattern.
    pub async fn remote_version(
        &self,
        client: &ReleaseClient,
        download_url: &Url,
    ) -> ResolveResult<String> {
        let final_url = client.resolve_final_url(download_url).await?;

        let base_name = final_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("");

        let version = self.pattern.extract_version(base_name).ok_or_else(|| {
            ResolveError::VersionNotInUrl {
                url: final_url.to_string(),
            }
        })?;

        debug!("Remote version {} from {}", version, final_url);
        Ok(version.to_string())
    }

    /// Determine the installed version from the current reference
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Io` when the reference or the candidate
    /// directory exists but cannot be inspected.
    pub async fn local_version(
        &self,
        current_reference: &Path,
        candidate_dir: &Path,
    ) -> ResolveResult<LocalVersion> {
        let io_err = |path: &Path, source: std::io::Error| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        };

        // follows the link, so a dangling link counts as absent
        let target_meta = match fs::metadata(current_reference).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LocalVersion::Absent);
            }
            Err(e) => return Err(io_err(current_reference, e)),
        };

        let link_meta = fs::symlink_metadata(current_reference)
            .await
            .map_err(|e| io_err(current_reference, e))?;

        if link_meta.file_type().is_symlink() {
            let target = fs::read_link(current_reference)
                .await
                .map_err(|e| io_err(current_reference, e))?;
            let name = target
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();

            return Ok(match self.pattern.extract_version(name) {
                Some(version) => {
                    debug!("Current reference links to {}", target.display());
                    LocalVersion::Installed(version.to_string())
                }
                None => LocalVersion::Unrecognized,
            });
        }

        self.match_by_size(current_reference, target_meta.len(), candidate_dir)
            .await
    }

    /// Plain-file fallback: artifacts whose size equals the reference's
    async fn match_by_size(
        &self,
        current_reference: &Path,
        size: u64,
        candidate_dir: &Path,
    ) -> ResolveResult<LocalVersion> {
        let mut entries = match fs::read_dir(candidate_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LocalVersion::Unrecognized);
            }
            Err(source) => {
                return Err(ResolveError::Io {
                    path: candidate_dir.to_path_buf(),
                    source,
                })
            }
        };

        let mut candidates = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| ResolveError::Io {
                path: candidate_dir.to_path_buf(),
                source,
            })?
        {
            let path = entry.path();
            if path == current_reference {
                continue;
            }

            let name = entry.file_name();
            let Some(version) = name.to_str().and_then(|n| self.pattern.extract_version(n)) else {
                continue;
            };

            match fs::metadata(&path).await {
                Ok(meta) if meta.is_file() && meta.len() == size => {
                    candidates.push(version.to_string());
                }
                _ => {}
            }
        }

        Ok(match candidates.len() {
            0 => LocalVersion::Unrecognized,
            1 => LocalVersion::Installed(candidates.remove(0)),
            _ => {
                candidates.sort_by(|a, b| descending(a, b));
                warn!(
                    "Current reference {} matches several artifacts by size: {}",
                    current_reference.display(),
                    candidates.join(", ")
                );
                LocalVersion::Ambiguous(candidates)
            }
        })
    }

    /// Whether `remote` should replace what is installed
    ///
    /// An unknown local version always needs an update. Otherwise the update is
    /// needed when the local version is strictly older. If either side does not
    /// parse, the configured policy decides between "no update" and an error.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::MalformedVersion` only under
    /// `VersionPolicy::Error`.
    pub fn needs_update(&self, local: &LocalVersion, remote: &str) -> ResolveResult<bool> {
        let Some(local) = local.version() else {
            return Ok(true);
        };

        match (Version::parse(local), Version::parse(remote)) {
            (Ok(local), Ok(remote)) => Ok(local < remote),
            (local_parsed, _) => match self.policy {
                VersionPolicy::NoUpdate => {
                    debug!(
                        "Cannot compare {} with {}; treating as up to date",
                        local, remote
                    );
                    Ok(false)
                }
                VersionPolicy::Error => Err(ResolveError::MalformedVersion {
                    version: if local_parsed.is_err() {
                        local.to_string()
                    } else {
                        remote.to_string()
                    },
                }),
            },
        }
    }
}

/// Highest version first; unparsable strings after every valid version
fn descending(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::ReleaseClient;
    use crate::constants::defaults;
    use mockito::Server;
    use tempfile::TempDir;

    fn resolver(policy: VersionPolicy) -> VersionResolver {
        VersionResolver::new(
            ArtifactPattern::new(defaults::FILE_NAME_PATTERN).unwrap(),
            policy,
        )
    }

    fn artifact(dir: &Path, version: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(format!("Cursor-{}-x86_64.AppImage", version));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_local_absent() {
        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join("Cursor.AppImage");
        let local = resolver(VersionPolicy::NoUpdate)
            .local_version(&link, temp_dir.path())
            .await
            .unwrap();
        assert_eq!(local, LocalVersion::Absent);
        assert!(local.is_unknown());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_from_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let target = artifact(temp_dir.path(), "1.0.0", "mock content");
        let link = temp_dir.path().join("Cursor.AppImage");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let local = resolver(VersionPolicy::NoUpdate)
            .local_version(&link, temp_dir.path())
            .await
            .unwrap();
        assert_eq!(local, LocalVersion::Installed("1.0.0".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_symlink_to_unrecognized_name() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("something-else.bin");
        std::fs::write(&target, "x").unwrap();
        let link = temp_dir.path().join("Cursor.AppImage");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let local = resolver(VersionPolicy::NoUpdate)
            .local_version(&link, temp_dir.path())
            .await
            .unwrap();
        assert_eq!(local, LocalVersion::Unrecognized);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_dangling_symlink_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join("Cursor.AppImage");
        std::os::unix::fs::symlink(
            temp_dir.path().join("Cursor-1.0.0-x86_64.AppImage"),
            &link,
        )
        .unwrap();

        let local = resolver(VersionPolicy::NoUpdate)
            .local_version(&link, temp_dir.path())
            .await
            .unwrap();
        assert_eq!(local, LocalVersion::Absent);
    }

    #[tokio::test]
    async fn test_local_plain_file_matched_by_size() {
        let temp_dir = TempDir::new().unwrap();
        artifact(temp_dir.path(), "1.0.0", "short");
        artifact(temp_dir.path(), "1.1.0", "much longer content");
        let copy = temp_dir.path().join("Cursor.AppImage");
        std::fs::write(&copy, "much longer content").unwrap();

        let local = resolver(VersionPolicy::NoUpdate)
            .local_version(&copy, temp_dir.path())
            .await
            .unwrap();
        assert_eq!(local, LocalVersion::Installed("1.1.0".to_string()));
    }

    #[tokio::test]
    async fn test_local_plain_file_without_match() {
        let temp_dir = TempDir::new().unwrap();
        artifact(temp_dir.path(), "1.0.0", "short");
        std::fs::write(temp_dir.path().join("notes.txt"), "1234567").unwrap();
        let copy = temp_dir.path().join("Cursor.AppImage");
        std::fs::write(&copy, "1234567").unwrap();

        let local = resolver(VersionPolicy::NoUpdate)
            .local_version(&copy, temp_dir.path())
            .await
            .unwrap();
        assert_eq!(local, LocalVersion::Unrecognized);
    }

    #[tokio::test]
    async fn test_local_plain_file_ambiguous_sizes() {
        let temp_dir = TempDir::new().unwrap();
        artifact(temp_dir.path(), "1.2.0", "same");
        artifact(temp_dir.path(), "1.10.0", "same");
        artifact(temp_dir.path(), "1.3.0", "same");
        let copy = temp_dir.path().join("Cursor.AppImage");
        std::fs::write(&copy, "same").unwrap();

        let local = resolver(VersionPolicy::NoUpdate)
            .local_version(&copy, temp_dir.path())
            .await
            .unwrap();
        assert_eq!(
            local,
            LocalVersion::Ambiguous(vec![
                "1.10.0".to_string(),
                "1.3.0".to_string(),
                "1.2.0".to_string()
            ])
        );
        assert_eq!(local.version(), Some("1.10.0"));
    }

    #[test]
    fn test_needs_update() {
        let r = resolver(VersionPolicy::NoUpdate);
        let installed = |v: &str| LocalVersion::Installed(v.to_string());

        assert!(r.needs_update(&LocalVersion::Absent, "1.0.0").unwrap());
        assert!(r.needs_update(&LocalVersion::Unrecognized, "1.0.0").unwrap());
        assert!(r.needs_update(&installed("1.0.0"), "1.0.1").unwrap());
        assert!(!r.needs_update(&installed("1.4.5"), "1.4.5").unwrap());
        assert!(!r.needs_update(&installed("2.0.0"), "1.4.5").unwrap());
    }

    #[test]
    fn test_needs_update_malformed_policy() {
        let lenient = resolver(VersionPolicy::NoUpdate);
        let strict = resolver(VersionPolicy::Error);
        let installed = LocalVersion::Installed("1.4".to_string());

        assert!(!lenient.needs_update(&installed, "1.4.5").unwrap());
        match strict.needs_update(&installed, "1.4.5") {
            Err(ResolveError::MalformedVersion { version }) => assert_eq!(version, "1.4"),
            other => panic!("Expected MalformedVersion, got {:?}", other),
        }

        let good = LocalVersion::Installed("1.4.5".to_string());
        match strict.needs_update(&good, "1.5") {
            Err(ResolveError::MalformedVersion { version }) => assert_eq!(version, "1.5"),
            other => panic!("Expected MalformedVersion, got {:?}", other),
        }

        // unknown local still updates, even under the strict policy
        assert!(strict.needs_update(&LocalVersion::Absent, "1.5").unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(LocalVersion::Absent.to_string(), "(unknown)");
        assert_eq!(
            LocalVersion::Installed("1.0.0".to_string()).to_string(),
            "1.0.0"
        );
        assert_eq!(
            LocalVersion::Ambiguous(vec!["2.0.0".to_string(), "1.0.0".to_string()]).to_string(),
            "2.0.0 (ambiguous: 2.0.0, 1.0.0)"
        );
    }

    #[tokio::test]
    async fn test_remote_version_through_redirects() {
        let mut server = Server::new_async().await;
        let _a = server
            .mock("HEAD", "/download/stable/linux-x64")
            .with_status(302)
            .with_header("location", "/production/Cursor-1.2.3-x86_64.AppImage")
            .create_async()
            .await;
        let _b = server
            .mock("HEAD", "/production/Cursor-1.2.3-x86_64.AppImage")
            .with_status(200)
            .create_async()
            .await;

        let client = ReleaseClient::new().unwrap();
        let url = Url::parse(&format!("{}/download/stable/linux-x64", server.url())).unwrap();
        let version = resolver(VersionPolicy::NoUpdate)
            .remote_version(&client, &url)
            .await
            .unwrap();
        assert_eq!(version, "1.2.3");
    }

    #[tokio::test]
    async fn test_remote_version_not_in_url() {
        let mut server = Server::new_async().await;
        let _a = server
            .mock("HEAD", "/download/stable/linux-x64")
            .with_status(200)
            .create_async()
            .await;

        let client = ReleaseClient::new().unwrap();
        let url = Url::parse(&format!("{}/download/stable/linux-x64", server.url())).unwrap();
        let result = resolver(VersionPolicy::NoUpdate)
            .remote_version(&client, &url)
            .await;
        assert!(matches!(result, Err(ResolveError::VersionNotInUrl { .. })));
    }
}
