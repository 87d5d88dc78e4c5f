//! Artifact download with atomic writes and streaming
//!
//! The body is streamed into `<artifact>.tmp` while the SHA-256 digest and the
//! progress tracker are fed chunk by chunk. Only after the whole body is on
//! disk and marked executable is the temporary file renamed into place, so an
//! existing artifact is always a complete one.

use std::path::{Path, PathBuf};
use std::time::Instant;

use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::app::hash::Sha256Digest;
use crate::app::progress::{ProgressCallback, ProgressTracker, ProgressUpdate};
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// Result of a download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The artifact was already on disk; no request was made
    AlreadyPresent,
    /// The artifact was fetched and written
    Downloaded { bytes: u64, digest: Sha256Digest },
}

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    progress: Option<&'a ProgressCallback>,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler) -> Self {
        Self {
            http_handler,
            progress: None,
        }
    }

    /// Report progress through `callback` while streaming
    pub fn with_progress(mut self, callback: Option<&'a ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Downloads `url` to `destination` unless it already exists
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The HTTP request fails or ends with a non-success status
    /// - A redirect has no usable `Location`
    /// - The body is shorter than its announced length
    /// - File I/O or the final rename fails
    pub async fn download_file(
        &self,
        url: &Url,
        destination: &Path,
    ) -> DownloadResult<DownloadOutcome> {
        if fs::try_exists(destination).await? {
            tracing::info!(
                "Artifact already present, skipping download: {}",
                destination.display()
            );
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = temp_path_for(destination);

        let (bytes, digest) = match self.download_to_temp(url, &temp_path).await {
            Ok(result) => result,
            Err(e) => {
                if fs::try_exists(&temp_path).await.unwrap_or(false) {
                    let _ = fs::remove_file(&temp_path).await;
                }
                tracing::error!("Download of {} failed: {}", url, e);
                return Err(e);
            }
        };

        fs::rename(&temp_path, destination).await.map_err(|source| {
            DownloadError::AtomicOperationFailed {
                temp_path: temp_path.clone(),
                final_path: destination.to_path_buf(),
                source,
            }
        })?;

        tracing::info!(
            "Successfully downloaded {} bytes to {}",
            bytes,
            destination.display()
        );
        Ok(DownloadOutcome::Downloaded { bytes, digest })
    }

    /// Streams the body of `url` into `temp_path`
    async fn download_to_temp(
        &self,
        url: &Url,
        temp_path: &Path,
    ) -> DownloadResult<(u64, Sha256Digest)> {
        let mut response = self.http_handler.get_with_single_hop(url).await?;

        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
            });
        }

        let expected = response.content_length();
        let mut tracker = ProgressTracker::new(expected, Instant::now());
        let mut hasher = Sha256::new();
        let mut file = File::create(temp_path).await?;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            if let Some(update) = tracker.record(chunk.len() as u64, Instant::now()) {
                self.report(&update);
            }
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Some(update) = tracker.finish(Instant::now()) {
            self.report(&update);
        }

        let received = tracker.bytes_downloaded();
        if let Some(expected) = expected {
            if received < expected {
                return Err(DownloadError::IncompleteDownload { received, expected });
            }
        }

        make_executable(temp_path).await?;

        Ok((received, Sha256Digest::from_hasher(hasher)))
    }

    fn report(&self, update: &ProgressUpdate) {
        if let Some(callback) = self.progress {
            callback(update);
        }
    }
}

/// `<destination>.tmp`, next to the final artifact
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(files::TEMP_FILE_SUFFIX);
    destination.with_file_name(name)
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(
        path,
        std::fs::Permissions::from_mode(files::ARTIFACT_PERMISSIONS),
    )
    .await
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
