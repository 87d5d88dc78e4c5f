//! Core HTTP operations
//!
//! Two request shapes exist and must stay distinct:
//! - `resolve_final_url` issues a HEAD through the redirect-following client
//!   and reports the last URL reached, however many hops it took.
//! - `get_with_single_hop` issues a GET that does not follow redirects; if the
//!   answer is a redirect, exactly one explicit request is made to its
//!   `Location`.
//!
//! There is no retry logic: a failed request is returned to the caller as is.

use reqwest::header::LOCATION;
use reqwest::{Client, Response};
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

/// HTTP operations handler
#[derive(Debug, Clone)]
pub struct HttpHandler {
    following: Client,
    direct: Client,
}

impl HttpHandler {
    /// Creates a new HttpHandler from a redirect-following and a direct client
    pub fn new(following: Client, direct: Client) -> Self {
        Self { following, direct }
    }

    /// Follows every redirect from `url` with HEAD requests and returns the
    /// final URL
    ///
    /// # Errors
    ///
    /// Returns the transport error on network failure, on too many redirects,
    /// or when the final status is not a success.
    pub async fn resolve_final_url(&self, url: &Url) -> reqwest::Result<Url> {
        let response = self
            .following
            .head(url.as_str())
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!("Resolved {} -> {}", url, response.url());
        Ok(response.url().clone())
    }

    /// Issues a GET without automatic redirects, following at most one
    /// explicit hop to the `Location` header
    ///
    /// The returned response still has to be checked for a success status.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if a request fails or a redirect carries no
    /// usable `Location`.
    pub async fn get_with_single_hop(&self, url: &Url) -> DownloadResult<Response> {
        let response = self.direct.get(url.as_str()).send().await?;

        if !response.status().is_redirection() {
            return Ok(response);
        }

        let location = redirect_target(url, &response)?;
        tracing::debug!(
            "Download redirected ({}) to {}",
            response.status().as_u16(),
            location
        );

        Ok(self.following.get(location.as_str()).send().await?)
    }
}

/// Resolves the `Location` header of a redirect against the request URL
fn redirect_target(base: &Url, response: &Response) -> DownloadResult<Url> {
    let raw = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DownloadError::MissingLocation {
            url: base.to_string(),
        })?;

    base.join(raw).map_err(|e| DownloadError::InvalidUrl {
        url: raw.to_string(),
        error: e.to_string(),
    })
}
