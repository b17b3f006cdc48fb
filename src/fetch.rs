//! HTTP downloads behind an injectable [`Fetcher`].
use std::time::Duration;

use anyhow::{Context as _, Result};

/// Overall timeout for a single download, including redirects.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(180);

/// Largest body accepted from a download (font archives run to tens of MB).
const MAX_DOWNLOAD_BYTES: u64 = 256 * 1024 * 1024;

/// Retrieves remote files.
///
/// Production code uses [`HttpFetcher`]; tests substitute a stub that serves
/// canned bytes so no network access happens.
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    /// Download `url` and return its body.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failures, non-success HTTP status, or
    /// bodies larger than the configured limit.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`Fetcher`] backed by a shared [`ureq::Agent`].
#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher with the default download timeout.
    #[must_use]
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("downloading {url}"))?;
        response
            .body_mut()
            .with_config()
            .limit(MAX_DOWNLOAD_BYTES)
            .read_to_vec()
            .with_context(|| format!("reading response body from {url}"))
    }
}

/// Test double that serves bytes per URL and records requests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct StubFetcher {
    bodies: std::collections::HashMap<String, Vec<u8>>,
    requests: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl StubFetcher {
    /// Serve `body` for `url`; any other URL fails.
    #[must_use]
    pub fn with(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_string(), body.to_vec());
        self
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map_or_else(|_| vec![], |g| g.clone())
    }
}

#[cfg(test)]
impl Fetcher for StubFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(url.to_string());
        }
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("stub: no body for {url}"))
    }
}
