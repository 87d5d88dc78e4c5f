//! HTTP client configuration and building logic
//!
//! Two clients are built from one configuration: one that follows redirects
//! (used to resolve the release URL to its versioned target) and one that
//! does not (used for the first request of a download, whose redirect is
//! followed by hand).

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::http;
use crate::errors::{DownloadError, DownloadResult};

/// Configuration for the HTTP clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Overall request timeout; `None` leaves the transport default
    pub request_timeout: Option<Duration>,
    /// Connect timeout; `None` leaves the transport default
    pub connect_timeout: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Redirect hops followed by the resolving client
    pub max_redirects: usize,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            connect_timeout: None,
            tcp_nodelay: true,
            max_redirects: http::MAX_REDIRECTS,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Client that transparently follows up to `max_redirects` hops
    pub fn build_following_client(&self) -> DownloadResult<Client> {
        self.builder()
            .redirect(Policy::limited(self.max_redirects))
            .build()
            .map_err(DownloadError::Http)
    }

    /// Client that hands redirect responses back to the caller
    pub fn build_direct_client(&self) -> DownloadResult<Client> {
        self.builder()
            .redirect(Policy::none())
            .build()
            .map_err(DownloadError::Http)
    }

    fn builder(&self) -> reqwest::ClientBuilder {
        let mut client_builder = Client::builder()
            .user_agent(self.user_agent.clone())
            .tcp_nodelay(self.tcp_nodelay);

        if let Some(timeout) = self.request_timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(timeout) = self.connect_timeout {
            client_builder = client_builder.connect_timeout(timeout);
        }

        client_builder
    }
}
