//! Shared blocking HTTP plumbing for the remote sources.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

const USER_AGENT: &str = concat!("poilens/", env!("CARGO_PKG_VERSION"));

/// Failure classification for sources that sit behind a retry loop.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// The remote signalled rate limiting (HTTP 429 or equivalent).
    #[error("rate limited by remote source")]
    RateLimited,
    /// Worth retrying: timeout, connection failure, 5xx.
    #[error("transient source failure: {0}")]
    Transient(String),
    /// Retrying will not help: malformed response, 4xx.
    #[error("terminal source failure: {0}")]
    Terminal(String),
}

impl SourceError {
    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            SourceError::RateLimited
        } else if status.is_server_error() {
            SourceError::Transient(format!("http {status}"))
        } else {
            SourceError::Terminal(format!("http {status}"))
        }
    }

    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            SourceError::Transient(err.to_string())
        } else {
            SourceError::Terminal(err.to_string())
        }
    }
}

/// Blocking client with a bounded per-request timeout. Redirects are
/// followed, which the file-serving endpoints rely on.
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// GET a URL and return the body bytes. Any failure is logged at debug and
/// collapses to None; callers treat absence as "this step produced nothing".
pub fn fetch_bytes(client: &Client, url: &str) -> Option<Vec<u8>> {
    let resp = match client.get(url).send() {
        Ok(resp) => resp,
        Err(err) => {
            log::debug!("{url}: request failed: {err}");
            return None;
        }
    };

    let status = resp.status();
    if !status.is_success() {
        log::debug!("{url}: {status}");
        return None;
    }

    match resp.bytes() {
        Ok(bytes) => Some(bytes.into()),
        Err(err) => {
            log::debug!("{url}: body read failed: {err}");
            None
        }
    }
}
