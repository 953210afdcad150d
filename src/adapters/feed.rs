//! Published-articles feed adapter (RSS or Atom).
//!
//! The feed is small and always current, so it is read fresh on every run
//! and never cached.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{send_text, CollectError, Collector, FetchError, HttpSettings};
use crate::domain::FeedEntry;

/// Reads the configured feed
pub struct FeedCollector {
    url: String,
    client: reqwest::Client,
}

impl FeedCollector {
    pub fn new(url: impl Into<String>, http: &HttpSettings) -> Result<Self, FetchError> {
        Ok(Self {
            url: url.into(),
            client: http.client()?,
        })
    }

    /// Download and parse the feed
    pub async fn fetch(&self) -> Result<Vec<FeedEntry>, FetchError> {
        let body = send_text(self.client.get(&self.url), &self.url).await?;
        let entries = parse_feed(&body, &self.url)?;
        info!(entries = entries.len(), "Collected feed entries");
        Ok(entries)
    }
}

/// Parse an RSS or Atom document into entries, in document order
pub fn parse_feed(body: &str, url: &str) -> Result<Vec<FeedEntry>, FetchError> {
    let feed = feed_rs::parser::parse(body.as_bytes()).map_err(|e| FetchError::Feed {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let mut entries = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let modified_at = entry
            .updated
            .or(entry.published)
            .ok_or_else(|| FetchError::MissingField {
                url: url.to_string(),
                field: format!("updated or published (entry {})", entry.id),
            })?;

        let link = entry
            .links
            .first()
            .map(|link| link.href.clone())
            .unwrap_or_default();
        debug!(link = %link, "Parsed feed entry");

        entries.push(FeedEntry {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            description: entry.summary.map(|t| t.content).unwrap_or_default(),
            modified_at,
            authors: entry.authors.into_iter().map(|p| p.name).collect(),
            link,
            content: entry.content.and_then(|c| c.body).unwrap_or_default(),
        });
    }

    Ok(entries)
}

#[async_trait]
impl Collector for FeedCollector {
    type Output = Vec<FeedEntry>;

    fn name(&self) -> &str {
        "feed"
    }

    async fn collect(&self, _force_refresh: bool) -> Result<Vec<FeedEntry>, CollectError> {
        Ok(self.fetch().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Blog</title>
    <link>https://blog.example.com/</link>
    <description>Posts</description>
    <item>
      <title>Second post</title>
      <link>https://www.blog.example.com/second</link>
      <description>Newer</description>
      <pubDate>Tue, 02 Jan 2024 10:00:00 +0100</pubDate>
    </item>
    <item>
      <title>First post</title>
      <link>https://www.blog.example.com/first</link>
      <pubDate>Mon, 01 Jan 2024 10:00:00 +0100</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_entries() {
        let entries = parse_feed(RSS, "https://blog.example.com/feed.xml").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Second post");
        assert_eq!(entries[0].link, "https://www.blog.example.com/second");
        assert_eq!(entries[0].modified_at.to_rfc3339(), "2024-01-02T09:00:00+00:00");
    }

    #[test]
    fn test_entry_without_dates_is_rejected() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>B</title><link>https://b.org/</link><description>d</description>
<item><title>Undated</title><link>https://b.org/x</link></item>
</channel></rss>"#;

        let err = parse_feed(rss, "https://b.org/feed").unwrap_err();
        assert!(matches!(err, FetchError::MissingField { .. }));
    }

    #[test]
    fn test_garbage_is_feed_error() {
        let err = parse_feed("not xml at all", "https://b.org/feed").unwrap_err();
        assert!(matches!(err, FetchError::Feed { .. }));
    }

    #[tokio::test]
    async fn test_collect_is_never_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .expect(2)
            .mount(&server)
            .await;

        let collector = FeedCollector::new(format!("{}/feed.xml", server.uri()), &HttpSettings::default()).unwrap();
        assert_eq!(collector.collect(false).await.unwrap().len(), 2);
        assert_eq!(collector.collect(false).await.unwrap().len(), 2);
    }
}
