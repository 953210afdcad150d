//! WebDAV upload of finished documents to the Nextcloud files API.

use tracing::info;
use url::Url;

use super::{base_url, send, FetchError, HttpSettings};

/// Where and as whom documents are uploaded
#[derive(Debug, Clone)]
pub struct WebDavSettings {
    pub host: String,
    pub username: String,
    pub password: String,

    /// Folder inside the user's files, e.g. `Logseq/pages`
    pub upload_dir: String,
}

/// Replaces documents in a WebDAV folder with PUT
pub struct WebDavPublisher {
    settings: WebDavSettings,
    client: reqwest::Client,
}

impl WebDavPublisher {
    pub fn new(settings: WebDavSettings, http: &HttpSettings) -> Result<Self, FetchError> {
        Ok(Self {
            settings,
            client: http.client()?,
        })
    }

    /// `{host}/remote.php/dav/files/{user}/{upload_dir}/{file}`, every
    /// segment percent-encoded
    pub fn document_url(&self, file: &str) -> Result<Url, FetchError> {
        let base = base_url(&self.settings.host);
        let mut url = Url::parse(&base).map_err(|e| FetchError::InvalidUrl {
            url: base.clone(),
            message: e.to_string(),
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| FetchError::InvalidUrl {
                url: base.clone(),
                message: "cannot hold a path".to_string(),
            })?;
            segments
                .pop_if_empty()
                .extend(["remote.php", "dav", "files", self.settings.username.as_str()])
                .extend(self.settings.upload_dir.split('/').filter(|s| !s.is_empty()))
                .push(file);
        }

        Ok(url)
    }

    /// Upload `content` as `file`, replacing what is there
    pub async fn upload(&self, file: &str, content: &str) -> Result<(), FetchError> {
        let url = self.document_url(file)?;
        let request = self
            .client
            .put(url.clone())
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .body(content.to_string());

        send(request, url.as_str()).await?;
        info!(url = %url, bytes = content.len(), "Uploaded document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(host: &str) -> WebDavPublisher {
        let settings = WebDavSettings {
            host: host.to_string(),
            username: "sander".to_string(),
            password: "pw".to_string(),
            upload_dir: "Logseq Graph/pages/".to_string(),
        };
        WebDavPublisher::new(settings, &HttpSettings::default()).unwrap()
    }

    #[test]
    fn test_document_url_encodes_segments() {
        let url = publisher("cloud.example.com").document_url("Stream.md").unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.example.com/remote.php/dav/files/sander/Logseq%20Graph/pages/Stream.md"
        );
    }

    #[tokio::test]
    async fn test_upload_puts_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/remote.php/dav/files/sander/Logseq%20Graph/pages/Bookmarks.md"))
            .and(basic_auth("sander", "pw"))
            .and(body_string("public:: true\n"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        publisher(&server.uri()).upload("Bookmarks.md", "public:: true\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_failure_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = publisher(&server.uri()).upload("Bookmarks.md", "x").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 403, .. }));
    }
}
