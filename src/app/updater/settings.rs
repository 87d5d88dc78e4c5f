//! Resolved runtime settings for the updater

use std::path::PathBuf;

use url::Url;

use crate::app::pattern::ArtifactPattern;
use crate::app::version::VersionPolicy;
use crate::constants::files;

/// Concrete values the updater runs with
///
/// Built once from the configuration file; every path is already expanded.
#[derive(Debug, Clone)]
pub struct UpdaterSettings {
    /// Release URL that redirects to the versioned artifact
    pub download_url: Url,
    /// Directory holding every downloaded artifact
    pub download_dir: PathBuf,
    /// Artifact naming pattern
    pub pattern: ArtifactPattern,
    /// The current reference (symlink to the active artifact)
    pub current_link: PathBuf,
    /// Audit ledger file
    pub ledger_path: PathBuf,
    /// How malformed versions are compared
    pub version_policy: VersionPolicy,
}

impl UpdaterSettings {
    /// File name of the artifact for `version`
    pub fn artifact_name(&self, version: &str) -> String {
        self.pattern.file_name(version)
    }

    /// Full path of the artifact for `version`
    pub fn artifact_path(&self, version: &str) -> PathBuf {
        self.download_dir.join(self.artifact_name(version))
    }

    /// Path of the `VERSION=` marker file
    pub fn version_file(&self) -> PathBuf {
        self.download_dir.join(files::VERSION_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::defaults;

    fn settings() -> UpdaterSettings {
        UpdaterSettings {
            download_url: Url::parse(defaults::DOWNLOAD_URL).unwrap(),
            download_dir: PathBuf::from("/opt/cursor"),
            pattern: ArtifactPattern::new(defaults::FILE_NAME_PATTERN).unwrap(),
            current_link: PathBuf::from("/opt/bin/Cursor.AppImage"),
            ledger_path: PathBuf::from("/opt/cursor/ledger.log"),
            version_policy: VersionPolicy::default(),
        }
    }

    #[test]
    fn test_artifact_paths() {
        let settings = settings();
        assert_eq!(
            settings.artifact_path("1.4.5"),
            PathBuf::from("/opt/cursor/Cursor-1.4.5-x86_64.AppImage")
        );
        assert_eq!(
            settings.version_file(),
            PathBuf::from("/opt/cursor/.cursor-version")
        );
    }
}
