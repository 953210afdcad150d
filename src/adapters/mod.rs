//! Adapters for the remote services.
//!
//! Collectors fetch from a service (or the cache), normalize the response
//! and hand back typed records. The WebDAV publisher writes finished
//! documents back to the note-taking backend.

pub mod bookmarks;
pub mod feed;
pub mod wallabag;
pub mod webdav;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::cache::CacheError;
use crate::domain::TimestampError;

// Re-export the collectors
pub use bookmarks::BookmarkCollector;
pub use feed::FeedCollector;
pub use wallabag::ArchiveCollector;
pub use webdav::WebDavPublisher;

/// Errors talking to a remote service
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response from {url} is missing '{field}'")]
    MissingField { url: String, field: String },

    #[error("Bad timestamp in response from {url}: {source}")]
    Timestamp {
        url: String,
        #[source]
        source: TimestampError,
    },

    #[error("Failed to parse feed from {url}: {message}")]
    Feed { url: String, message: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors from a collection run
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A source of normalized records
#[async_trait]
pub trait Collector: Send + Sync {
    /// What one collection run yields
    type Output: Send;

    /// Human-readable source name
    fn name(&self) -> &str;

    /// Collect from the cache or the remote service.
    ///
    /// `force_refresh` bypasses any cache the collector keeps.
    async fn collect(&self, force_refresh: bool) -> Result<Self::Output, CollectError>;
}

/// HTTP client settings shared by every adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HttpSettings {
    /// Build a client with these timeouts
    pub fn client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(concat!("outline-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)
    }
}

/// Send a request and read a JSON body, mapping every failure to `FetchError`
pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<T, FetchError> {
    let body = send_text(request, url).await?;
    serde_json::from_str(&body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Send a request and read the body as text
pub(crate) async fn send_text(request: reqwest::RequestBuilder, url: &str) -> Result<String, FetchError> {
    let response = send(request, url).await?;
    response.text().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })
}

/// Send a request and fail on any non-success status
pub(crate) async fn send(request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response, FetchError> {
    let response = request.send().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Hostname of a URL without a leading `www.`; empty when there is none
pub fn display_host(url: &str) -> String {
    let host = url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_string()))
        .unwrap_or_default();

    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Normalize a configured host into a base URL without a trailing slash
pub fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}
