//! Remote template fetching for profile entries.
//!
//! A remote entry is probed with a short HEAD request (falling back to GET),
//! then downloaded into a temporary file that keeps the URL's extension.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tempfile::NamedTempFile;
use url::Url;

use crate::config::FetchSettings;

/// Errors from remote fetches. All are per-entry and non-fatal.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("unexpected status: {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("temp file: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP fetcher with separate probe and download clients
pub struct RemoteFetcher {
    probe: Client,
    download: Client,
}

impl RemoteFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        Ok(Self {
            probe: build_client(settings.probe_timeout)?,
            download: build_client(settings.download_timeout)?,
        })
    }

    /// Check that `url` answers with a 2xx/3xx status.
    pub async fn validate(&self, url: &Url) -> Result<(), FetchError> {
        match self.probe.head(url.clone()).send().await {
            Ok(resp) if is_ok_status(resp.status()) => return Ok(()),
            Ok(resp) => tracing::debug!("HEAD {} returned {}, retrying with GET", url, resp.status()),
            Err(e) => tracing::debug!("HEAD {} failed: {}, retrying with GET", url, e),
        }

        let resp = self
            .probe
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;
        let status = resp.status();
        if !is_ok_status(status) {
            return Err(FetchError::Unreachable(format!("unexpected status: {status}")));
        }
        Ok(())
    }

    /// Download `url` into a fresh temporary file.
    ///
    /// The file is removed when the returned handle is dropped.
    pub async fn download_to_temp(&self, url: &Url) -> Result<NamedTempFile, FetchError> {
        let resp = self.download.get(url.clone()).send().await?;
        let status = resp.status();
        if !is_ok_status(status) {
            return Err(FetchError::Status(status));
        }
        let body = resp.bytes().await?;

        let suffix = url_extension(url);
        let mut file = tempfile::Builder::new()
            .prefix("claim-template-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&body)?;
        file.flush()?;
        Ok(file)
    }
}

fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

fn is_ok_status(status: StatusCode) -> bool {
    (200..400).contains(&status.as_u16())
}

/// Extension of the URL path including the leading dot, or empty.
fn url_extension(url: &Url) -> String {
    Path::new(url.path())
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
