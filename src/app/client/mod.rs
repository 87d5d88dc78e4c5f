//! HTTP client for the release server
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: redirect resolution and single-hop GET
//! - `download`: artifact download with atomic writes and progress

use std::path::Path;

use url::Url;

use crate::app::progress::ProgressCallback;
use crate::errors::DownloadResult;

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;
pub use download::{temp_path_for, DownloadOutcome};

use download::DownloadHandler;
use http::HttpHandler;

/// HTTP client used by the updater
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    http_handler: HttpHandler,
}

impl ReleaseClient {
    /// Creates a client with the default configuration
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::Http` if the underlying clients cannot be built
    pub fn new() -> DownloadResult<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Creates a client with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::Http` if the underlying clients cannot be built
    pub fn with_config(config: &ClientConfig) -> DownloadResult<Self> {
        let http_handler = HttpHandler::new(
            config.build_following_client()?,
            config.build_direct_client()?,
        );
        Ok(Self { http_handler })
    }

    /// Follows every redirect from `url` and returns the last URL reached
    ///
    /// # Errors
    ///
    /// Returns the transport error on network failure or a non-success
    /// final status
    pub async fn resolve_final_url(&self, url: &Url) -> reqwest::Result<Url> {
        self.http_handler.resolve_final_url(url).await
    }

    /// Downloads `url` to `destination`, skipping the request entirely when
    /// the destination already exists
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on transfer or file system failure
    pub async fn download_file(
        &self,
        url: &Url,
        destination: &Path,
        progress: Option<&ProgressCallback>,
    ) -> DownloadResult<DownloadOutcome> {
        DownloadHandler::new(&self.http_handler)
            .with_progress(progress)
            .download_file(url, destination)
            .await
    }
}
