//! Collector Integration Tests
//!
//! Collectors against mock services, through the on-disk cache.

use std::collections::BTreeSet;

use outline_sync::adapters::bookmarks::BookmarkSettings;
use outline_sync::adapters::{BookmarkCollector, CollectError, Collector, FetchError, HttpSettings};
use outline_sync::cache::CacheStore;
use outline_sync::core::{FolderTree, TreeRenderer};
use outline_sync::domain::DEFAULT_TIMEZONE;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE: &str = "/index.php/apps/bookmarks/public/rest/v2";

fn collector(server: &MockServer, store: &CacheStore) -> BookmarkCollector {
    let settings = BookmarkSettings {
        host: server.uri(),
        username: "user".to_string(),
        password: "secret".to_string(),
    };
    BookmarkCollector::new(settings, &HttpSettings::default(), store.file("bookmarks"), DEFAULT_TIMEZONE).unwrap()
}

async fn mount_folders(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{}/folder", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": [
                {"id": 10, "title": "Reading", "parent_folder": -1, "children": [
                    {"id": 11, "title": "  ", "parent_folder": 10, "children": []}
                ]}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_empty_first_page_is_not_an_error() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(format!("{}/bookmark", BASE)))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;
    mount_folders(&server).await;

    let folders = collector(&server, &CacheStore::new(temp.path())).collect(true).await.unwrap();
    let titles: Vec<&str> = folders.iter().map(|f| f.title.as_str()).collect();
    assert_eq!(titles, vec!["Reading", "(no title)"]);
    assert!(folders.iter().all(|f| f.bookmarks.is_empty()));
}

#[tokio::test]
async fn test_fresh_cache_avoids_network_until_refresh() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path());

    Mock::given(method("GET"))
        .and(path(format!("{}/bookmark", BASE)))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"id": 1, "title": "A", "url": "http://www.example.com/a", "added": 1704186000, "folders": [10], "tags": []}
        ]})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/bookmark", BASE)))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    mount_folders(&server).await;

    let collector = collector(&server, &store);
    let first = collector.collect(false).await.unwrap();
    let cached = collector.collect(false).await.unwrap();
    assert_eq!(first, cached);

    let refreshed = collector.collect(true).await.unwrap();
    assert_eq!(first, refreshed);

    // Top-level folders report parent -1 and sit at root
    let tree = FolderTree::new(cached, &BTreeSet::new());
    let out = TreeRenderer::default().render(&tree).unwrap();
    assert_eq!(
        out,
        "- **Reading**\n\t- **(no title)**\n\t- [A](http://www.example.com/a) (example.com)\n"
    );
}

#[tokio::test]
async fn test_folder_listing_without_data_is_fetch_error() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(format!("{}/bookmark", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/folder", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "error"})))
        .mount(&server)
        .await;

    let store = CacheStore::new(temp.path());
    let err = collector(&server, &store).collect(false).await.unwrap_err();
    assert!(matches!(err, CollectError::Fetch(FetchError::MissingField { .. })));
    assert!(!store.file("bookmarks").path().exists());
}
