//! Read-it-later archive adapter (Wallabag API).
//!
//! A full fetch:
//! 1. exchanges the configured credentials for a bearer token,
//! 2. makes every archived private entry public, one PATCH at a time,
//! 3. reads the public archived entries and normalizes them to `Article`.
//!
//! Step 2 is throttled with a fixed delay after each update. The same delay is
//! applied between pages in step 3.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info};

use super::{base_url, send, send_json, CollectError, Collector, FetchError, HttpSettings};
use crate::cache::CacheFile;
use crate::domain::{parse_timestamp, Annotation, Article};

/// Entries made public per listing page
pub const PUBLISH_PAGE_SIZE: usize = 5;

/// Entries read per listing page
pub const LIST_PAGE_SIZE: usize = 50;

/// Default pause after each publish call and between listing pages
pub const DEFAULT_PUBLISH_DELAY: Duration = Duration::from_secs(2);

/// Connection details for the archive service
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    pub host: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,

    /// Throttle between write calls and between listing pages
    pub delay: Duration,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// One page of `/api/entries.json`
#[derive(Debug, Deserialize)]
struct EntryPage {
    #[serde(default)]
    pages: u32,
    #[serde(default)]
    total: u32,
    #[serde(rename = "_embedded")]
    embedded: Option<Embedded>,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    #[serde(default)]
    items: Vec<RemoteEntry>,
}

#[derive(Debug, Deserialize)]
struct RemoteEntry {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    url: String,
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    archived_at: Option<String>,
    created_at: String,
    #[serde(default)]
    tags: Vec<RemoteTag>,
    #[serde(default)]
    annotations: Vec<RemoteAnnotation>,
}

#[derive(Debug, Deserialize)]
struct RemoteTag {
    label: String,
}

#[derive(Debug, Deserialize)]
struct RemoteAnnotation {
    #[serde(default)]
    quote: String,
    #[serde(default)]
    text: Option<String>,
}

/// Collects archived articles and publishes them on the way
pub struct ArchiveCollector {
    settings: ArchiveSettings,
    client: reqwest::Client,
    cache: CacheFile,
    zone: Tz,
}

impl ArchiveCollector {
    /// Create a collector caching into `cache`
    pub fn new(
        settings: ArchiveSettings,
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

    fn url(&self, path: &str) -> String {
        format!("{}/{}", base_url(&self.settings.host), path)
    }

    /// Exchange the password credentials for a bearer token
    pub async fn access_token(&self) -> Result<String, FetchError> {
        let url = self.url("oauth/v2/token");
        let request = self.client.post(&url).form(&[
            ("grant_type", "password"),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("username", self.settings.username.as_str()),
            ("password", self.settings.password.as_str()),
        ]);

        let token: TokenResponse = send_json(request, &url).await?;
        debug!("Obtained archive access token");
        Ok(token.access_token)
    }

    async fn entry_page(&self, token: &str, query: &str, page: u32) -> Result<(EntryPage, String), FetchError> {
        let url = self.url(&format!("api/entries.json?{}&page={}", query, page));
        let page: EntryPage = send_json(self.client.get(&url).bearer_auth(token), &url).await?;
        Ok((page, url))
    }

    /// Make every archived private entry public.
    ///
    /// Pages are read in sequence while entries leave the private listing, so
    /// some entries may only be published on the next run.
    pub async fn publish_archived(&self, token: &str) -> Result<usize, FetchError> {
        let query = format!("archive=1&sort=archived&perPage={}&public=0", PUBLISH_PAGE_SIZE);
        let mut page = 1;
        let mut published = 0;

        loop {
            let (listing, _) = self.entry_page(token, &query, page).await?;
            if page == 1 && listing.total > 0 {
                info!(count = listing.total, "Publishing archived articles");
            }

            let items = match listing.embedded {
                Some(embedded) if !embedded.items.is_empty() => embedded.items,
                _ => break,
            };

            for item in items {
                let url = self.url(&format!("api/entries/{}.json", item.id));
                let request = self
                    .client
                    .patch(&url)
                    .bearer_auth(token)
                    .form(&[("public", "1")]);
                send(request, &url).await?;
                published += 1;
                debug!(id = item.id, "Published article");

                tokio::time::sleep(self.settings.delay).await;
            }

            if listing.pages <= page {
                break;
            }
            page += 1;
        }

        Ok(published)
    }

    /// Read every public archived entry, most recently archived first
    pub async fn fetch_public(&self, token: &str) -> Result<Vec<Article>, FetchError> {
        let query = format!(
            "archive=1&sort=archived&perPage={}&public=1&detail=metadata",
            LIST_PAGE_SIZE
        );
        let mut page = 1;
        let mut articles = Vec::new();

        loop {
            if page > 1 {
                tokio::time::sleep(self.settings.delay).await;
            }

            let (listing, url) = self.entry_page(token, &query, page).await?;
            debug!(page, pages = listing.pages, "Fetched archive page");

            let items = match listing.embedded {
                Some(embedded) if !embedded.items.is_empty() => embedded.items,
                _ => break,
            };

            for item in items {
                articles.push(self.normalize(item, &url)?);
            }

            if listing.pages <= page {
                break;
            }
            page += 1;
        }

        Ok(articles)
    }

    /// Token, publish, then list
    pub async fn fetch(&self) -> Result<Vec<Article>, FetchError> {
        let token = self.access_token().await?;
        let published = self.publish_archived(&token).await?;
        let articles = self.fetch_public(&token).await?;

        info!(published, articles = articles.len(), "Collected archived articles");
        Ok(articles)
    }

    fn normalize(&self, item: RemoteEntry, url: &str) -> Result<Article, FetchError> {
        let archived = item.archived_at.ok_or_else(|| FetchError::MissingField {
            url: url.to_string(),
            field: format!("archived_at (entry {})", item.id),
        })?;
        let uid = item.uid.ok_or_else(|| FetchError::MissingField {
            url: url.to_string(),
            field: format!("uid (entry {})", item.id),
        })?;

        let mut article = Article {
            title: item.title.unwrap_or_default(),
            share_url: self.url(&format!("share/{}", uid)),
            original_url: item.url,
            archived_at: self.timestamp(&archived, url)?,
            created_at: self.timestamp(&item.created_at, url)?,
            tags: Vec::new(),
            annotations: Vec::new(),
        };

        for tag in item.tags {
            article.add_tag(tag.label);
        }
        article.annotations = item
            .annotations
            .into_iter()
            .map(|a| Annotation {
                quote: a.quote,
                text: a.text.unwrap_or_default(),
            })
            .collect();

        Ok(article)
    }

    fn timestamp(&self, raw: &str, url: &str) -> Result<DateTime<Utc>, FetchError> {
        parse_timestamp(raw, self.zone).map_err(|source| FetchError::Timestamp {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Collector for ArchiveCollector {
    type Output = Vec<Article>;

    fn name(&self) -> &str {
        "wallabag"
    }

    async fn collect(&self, force_refresh: bool) -> Result<Vec<Article>, CollectError> {
        self.cache
            .fetch_or_refresh(force_refresh, || async {
                self.fetch().await.map_err(CollectError::from)
            })
            .await
    }
}
