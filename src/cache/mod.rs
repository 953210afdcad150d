//! On-disk JSON cache for collected payloads.
//!
//! Each source owns one file holding an envelope:
//!
//! ```text
//! { "moment": 1704186000, "data": <normalized payload> }
//! ```
//!
//! The envelope is replaced as a whole on every successful collection and left
//! alone when a collection fails, so the last good payload survives a bad run.
//! Writes are plain overwrites: a crash mid-write leaves a corrupt file, which
//! the next run reports as `CacheError::Parse` and rebuilds from the source.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

/// Maximum cache age before a refresh is required (12 hours)
pub const DEFAULT_MAX_AGE_SECS: i64 = 12 * 60 * 60;

/// Errors that can occur reading or writing a cache file
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to parse cache file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize cache file {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cache IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Whether the file exists but holds something undecodable
    pub fn is_parse(&self) -> bool {
        matches!(self, CacheError::Parse { .. })
    }
}

/// A payload paired with the moment it was collected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    /// Unix seconds at which the payload was written
    pub moment: i64,

    pub data: T,
}

impl<T> CacheEnvelope<T> {
    /// Wrap a payload collected right now
    pub fn new(data: T) -> Self {
        Self {
            moment: Utc::now().timestamp(),
            data,
        }
    }
}

/// Envelope header, read without decoding the payload
#[derive(Deserialize)]
struct EnvelopeMoment {
    moment: i64,
}

/// Directory holding one cache file per source
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    max_age_secs: i64,
}

impl CacheStore {
    /// Create a store rooted at `dir` with the default 12 hour threshold
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
        }
    }

    /// Override the staleness threshold
    pub fn with_max_age(mut self, max_age_secs: i64) -> Self {
        self.max_age_secs = max_age_secs;
        self
    }

    /// Get the cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a named source (`{dir}/{name}.json`)
    pub fn file(&self, name: &str) -> CacheFile {
        CacheFile {
            path: self.dir.join(format!("{}.json", name)),
            max_age_secs: self.max_age_secs,
        }
    }
}

/// A single source's cache file
#[derive(Debug, Clone)]
pub struct CacheFile {
    path: PathBuf,
    max_age_secs: i64,
}

impl CacheFile {
    /// Create a cache file handle with an explicit threshold
    pub fn new(path: impl Into<PathBuf>, max_age_secs: i64) -> Self {
        Self {
            path: path.into(),
            max_age_secs,
        }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the cache must be refreshed now
    pub async fn is_stale(&self) -> Result<bool, CacheError> {
        self.is_stale_at(Utc::now()).await
    }

    /// Whether the cache must be refreshed at `now`.
    ///
    /// A missing file is stale, not an error. A file that exists but does not
    /// decode is `CacheError::Parse`.
    pub async fn is_stale_at(&self, now: DateTime<Utc>) -> Result<bool, CacheError> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No cache file");
                return Ok(true);
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let header: EnvelopeMoment =
            serde_json::from_slice(&content).map_err(|source| CacheError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let age = now.timestamp() - header.moment;
        debug!(path = %self.path.display(), age, max_age = self.max_age_secs, "Cache age");
        Ok(age > self.max_age_secs)
    }

    /// Load the cached payload
    pub async fn load<T: DeserializeOwned>(&self) -> Result<T, CacheError> {
        Ok(self.load_envelope().await?.data)
    }

    /// Load the whole envelope
    pub async fn load_envelope<T: DeserializeOwned>(&self) -> Result<CacheEnvelope<T>, CacheError> {
        // Raw bytes: invalid UTF-8 is a decode failure, not an IO one
        let content = fs::read(&self.path)
            .await
            .map_err(|source| CacheError::Io {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_slice(&content).map_err(|source| CacheError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write `{moment: now, data}`, replacing any previous content
    pub async fn save<T: Serialize>(&self, data: &T) -> Result<(), CacheError> {
        self.save_envelope(&CacheEnvelope::new(data)).await
    }

    /// Write a prepared envelope
    pub async fn save_envelope<T: Serialize>(&self, envelope: &CacheEnvelope<T>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| CacheError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let content =
            serde_json::to_string_pretty(envelope).map_err(|source| CacheError::Serialize {
                path: self.path.clone(),
                source,
            })?;

        fs::write(&self.path, content)
            .await
            .map_err(|source| CacheError::Io {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "Cache saved");
        Ok(())
    }

    /// Serve the cached payload when it is fresh, otherwise run `refresh`,
    /// store its result and return it.
    ///
    /// `force_refresh` skips the cache entirely. A corrupt cache file counts
    /// as stale. When `refresh` fails the file is not touched.
    pub async fn fetch_or_refresh<T, E, F, Fut>(&self, force_refresh: bool, refresh: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if force_refresh {
            debug!(path = %self.path.display(), "Skipping cache on request");
        } else if let Some(data) = self.read_if_fresh().await? {
            debug!(path = %self.path.display(), "Using cache");
            return Ok(data);
        }

        let data = refresh().await?;
        self.save(&data).await?;
        Ok(data)
    }

    async fn read_if_fresh<T: DeserializeOwned>(&self) -> Result<Option<T>, CacheError> {
        let stale = match self.is_stale().await {
            Ok(stale) => stale,
            Err(e) if e.is_parse() => {
                warn!("{}; rebuilding from source", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if stale {
            debug!(path = %self.path.display(), "Cache is stale");
            return Ok(None);
        }

        match self.load().await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.is_parse() => {
                warn!("{}; rebuilding from source", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
