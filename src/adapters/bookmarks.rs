//! Bookmark service adapter (Nextcloud Bookmarks REST API v2).
//!
//! A full fetch reads every bookmark page by page, then the folder tree, and
//! files each bookmark under its first folder. The result is cached as the
//! flat folder list.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info};

use super::{base_url, send_json, CollectError, Collector, FetchError, HttpSettings};
use crate::cache::CacheFile;
use crate::core::folder_tree::assemble;
use crate::domain::{parse_timestamp, Bookmark, FiledBookmark, Folder, FolderNode, UNFILED_FOLDER_ID};

/// Bookmarks requested per page
pub const PAGE_SIZE: usize = 100;

const API_PATH: &str = "index.php/apps/bookmarks/public/rest/v2";

/// Connection details for the bookmark service
#[derive(Debug, Clone)]
pub struct BookmarkSettings {
    /// Host or base URL of the Nextcloud instance
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Envelope around every API response; `data` is absent on errors
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: Option<T>,
}

/// A bookmark as the API returns it
#[derive(Debug, Deserialize)]
struct RemoteBookmark {
    #[serde(default)]
    title: String,
    url: String,
    added: RawTimestamp,
    #[serde(default)]
    folders: Vec<i64>,
}

/// `added` is unix seconds, but older servers send a date string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Seconds(i64),
    Text(String),
}

/// Collects the folder tree and its bookmarks
pub struct BookmarkCollector {
    settings: BookmarkSettings,
    client: reqwest::Client,
    cache: CacheFile,
    zone: Tz,
}

impl BookmarkCollector {
    /// Create a collector caching into `cache`
    pub fn new(
        settings: BookmarkSettings,
        http: &HttpSettings,
        cache: CacheFile,
        zone: Tz,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            settings,
            client: http.client()?,
            cache,
            zone,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", base_url(&self.settings.host), API_PATH, path)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Fetch every bookmark, starting at page 0
    pub async fn fetch_bookmarks(&self) -> Result<Vec<FiledBookmark>, FetchError> {
        let mut filed = Vec::new();
        let mut page = 0usize;

        loop {
            let url = self.api_url(&format!("bookmark?limit={}&page={}", PAGE_SIZE, page));
            let response: ApiResponse<Vec<RemoteBookmark>> = send_json(self.get(&url), &url).await?;

            let Some(items) = response.data else {
                debug!(page, "No data in bookmark page, stopping");
                break;
            };
            if items.is_empty() {
                break;
            }

            debug!(page, count = items.len(), "Fetched bookmark page");
            for item in items {
                filed.push(self.normalize(item, &url)?);
            }
            page += 1;
        }

        Ok(filed)
    }

    /// Fetch the nested folder listing
    pub async fn fetch_folders(&self) -> Result<Vec<FolderNode>, FetchError> {
        let url = self.api_url("folder");
        let response: ApiResponse<Vec<FolderNode>> = send_json(self.get(&url), &url).await?;

        response.data.ok_or_else(|| FetchError::MissingField {
            url: url.clone(),
            field: "data".to_string(),
        })
    }

    /// Fetch both listings and assemble the flat folder list
    pub async fn fetch(&self) -> Result<Vec<Folder>, FetchError> {
        let bookmarks = self.fetch_bookmarks().await?;
        let nodes = self.fetch_folders().await?;
        let folders = assemble(&nodes, bookmarks);

        info!(
            folders = folders.len(),
            bookmarks = folders.iter().map(|f| f.bookmarks.len()).sum::<usize>(),
            "Collected bookmarks"
        );
        Ok(folders)
    }

    fn normalize(&self, item: RemoteBookmark, url: &str) -> Result<FiledBookmark, FetchError> {
        let added_at = match item.added {
            RawTimestamp::Seconds(secs) => {
                Utc.timestamp_opt(secs, 0)
                    .single()
                    .ok_or_else(|| FetchError::MissingField {
                        url: url.to_string(),
                        field: "added".to_string(),
                    })?
            }
            RawTimestamp::Text(text) => parse_added(&text, self.zone, url)?,
        };

        Ok(FiledBookmark {
            folder_id: item.folders.first().copied().unwrap_or(UNFILED_FOLDER_ID),
            bookmark: Bookmark::new(item.title, item.url, added_at),
        })
    }
}

fn parse_added(text: &str, zone: Tz, url: &str) -> Result<DateTime<Utc>, FetchError> {
    parse_timestamp(text, zone).map_err(|source| FetchError::Timestamp {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl Collector for BookmarkCollector {
    type Output = Vec<Folder>;

    fn name(&self) -> &str {
        "bookmarks"
    }

    async fn collect(&self, force_refresh: bool) -> Result<Vec<Folder>, CollectError> {
        self.cache
            .fetch_or_refresh(force_refresh, || async {
                self.fetch().await.map_err(CollectError::from)
            })
            .await
    }
}
