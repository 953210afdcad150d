//! Where finished documents go.

use std::path::PathBuf;

use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::adapters::{FetchError, WebDavPublisher};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Upload(#[from] FetchError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Target for a rendered document
pub enum Destination {
    /// Upload over WebDAV
    Remote(WebDavPublisher),

    /// Write into a local directory (debug runs)
    Local(PathBuf),
}

impl Destination {
    /// Write `content` as `file`, replacing any previous version.
    ///
    /// Returns where the document ended up.
    pub async fn publish(&self, file: &str, content: &str) -> Result<String, PublishError> {
        match self {
            Destination::Remote(publisher) => {
                publisher.upload(file, content).await?;
                Ok(publisher.document_url(file)?.to_string())
            }
            Destination::Local(dir) => {
                let path = dir.join(file);
                fs::create_dir_all(dir).await.map_err(|source| PublishError::Write {
                    path: dir.clone(),
                    source,
                })?;
                fs::write(&path, content).await.map_err(|source| PublishError::Write {
                    path: path.clone(),
                    source,
                })?;

                info!(path = %path.display(), "Wrote document");
                Ok(path.display().to_string())
            }
        }
    }
}
