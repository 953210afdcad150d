//! Configuration for outline-sync.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (NEXTCLOUD_*, WALLABAG_*, FEED_URL, OUTLINE_SYNC_*)
//! 2. Config file (.outline-sync/config.yaml)
//! 3. Defaults (cache in the user cache dir, output in the working directory)
//!
//! Config file discovery:
//! - `--config <path>`, then `$OUTLINE_SYNC_CONFIG`
//! - Otherwise searches the current directory and parents for .outline-sync/config.yaml
//! - Relative paths in the file resolve against the directory holding .outline-sync/
//!
//! Credentials are only checked when a command asks for the section that
//! needs them, so `outline-sync bookmarks` works without archive settings.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::adapters::bookmarks::BookmarkSettings;
use crate::adapters::wallabag::{ArchiveSettings, DEFAULT_PUBLISH_DELAY};
use crate::adapters::webdav::WebDavSettings;
use crate::adapters::HttpSettings;
use crate::cache::CacheStore;
use crate::core::template::{DateStyle, DEFAULT_DATE_FORMAT};
use crate::domain::{parse_zone, DEFAULT_TIMEZONE};

/// Directory holding the config file
pub const CONFIG_DIR: &str = ".outline-sync";

/// Config file name inside `CONFIG_DIR`
pub const CONFIG_FILE: &str = "config.yaml";

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "OUTLINE_SYNC_CONFIG";

/// Configuration problems, raised before any request is made
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing setting {key} (set {env} or add it to the config file)")]
    Missing { key: &'static str, env: &'static str },

    #[error("Invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub nextcloud: NextcloudConfig,
    #[serde(default)]
    pub bookmarks: BookmarksConfig,
    #[serde(default)]
    pub wallabag: WallabagConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Cache directory (relative to the project root)
    pub cache: Option<String>,
    /// Local output directory for debug runs
    pub output: Option<String>,
    /// Template override directory
    pub templates: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NextcloudConfig {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Folder documents are uploaded to, e.g. `Logseq/pages`
    pub upload_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookmarksConfig {
    /// Folders whose children are shown at root level
    #[serde(default)]
    pub ignored_parent_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WallabagConfig {
    pub host: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub publish_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    pub timezone: Option<String>,
    pub date_format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    pub connect_timeout_seconds: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths and overrides applied
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    pub templates_dir: Option<PathBuf>,
    pub nextcloud: NextcloudConfig,
    pub ignored_parent_ids: BTreeSet<i64>,
    pub wallabag: WallabagConfig,
    pub feed_url: Option<String>,
    pub timezone: Tz,
    pub date_format: String,
    pub http: HttpSettings,
}

/// Find config file by searching `start` and its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(&path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Directory relative paths in `config_path` are resolved against
fn project_root(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or(Path::new("."));
    if parent.file_name().map_or(false, |name| name == CONFIG_DIR) {
        parent.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

/// Override `slot` with the environment value when one is set
fn apply_env(slot: &mut Option<String>, name: &str, env: &dyn Fn(&str) -> Option<String>) {
    if let Some(value) = env(name).filter(|v| !v.trim().is_empty()) {
        *slot = Some(value);
    }
}

/// A required, non-empty setting
fn required(value: &Option<String>, key: &'static str, env: &'static str) -> Result<String, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::Missing { key, env }),
    }
}

impl Config {
    /// Load from the process environment and working directory
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_with(explicit, &cwd, &|name| std::env::var(name).ok())
    }

    /// Load with an explicit working directory and environment lookup
    pub fn load_with(
        explicit: Option<&Path>,
        cwd: &Path,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let config_file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => match env(CONFIG_ENV) {
                Some(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
                _ => find_config_file(cwd),
            },
        };

        let (file, base) = match &config_file {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                (load_config_file(path)?, project_root(path))
            }
            None => {
                debug!("No config file found, using environment and defaults");
                (ConfigFile::default(), cwd.to_path_buf())
            }
        };

        let mut config = Self::resolve(file, &base, cwd, env)?;
        config.config_file = config_file;
        Ok(config)
    }

    /// Apply environment overrides and defaults to a parsed file
    pub fn resolve(
        mut file: ConfigFile,
        base: &Path,
        cwd: &Path,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        apply_env(&mut file.nextcloud.host, "NEXTCLOUD_HOST", env);
        apply_env(&mut file.nextcloud.username, "NEXTCLOUD_USERNAME", env);
        apply_env(&mut file.nextcloud.password, "NEXTCLOUD_PASSWORD", env);
        apply_env(&mut file.nextcloud.upload_dir, "NEXTCLOUD_UPLOAD_DIR", env);
        apply_env(&mut file.wallabag.host, "WALLABAG_HOST", env);
        apply_env(&mut file.wallabag.client_id, "WALLABAG_CLIENT_ID", env);
        apply_env(&mut file.wallabag.client_secret, "WALLABAG_CLIENT_SECRET", env);
        apply_env(&mut file.wallabag.username, "WALLABAG_USERNAME", env);
        apply_env(&mut file.wallabag.password, "WALLABAG_PASSWORD", env);
        apply_env(&mut file.feed.url, "FEED_URL", env);
        apply_env(&mut file.stream.timezone, "OUTLINE_SYNC_TIMEZONE", env);

        let cache_dir = if let Some(dir) = env("OUTLINE_SYNC_CACHE").filter(|v| !v.trim().is_empty()) {
            PathBuf::from(dir)
        } else if let Some(ref dir) = file.paths.cache {
            resolve_path(base, dir)
        } else {
            dirs::cache_dir()
                .map(|dir| dir.join("outline-sync"))
                .unwrap_or_else(|| cwd.join(CONFIG_DIR).join("cache"))
        };

        let output_dir = match file.paths.output {
            Some(ref dir) => resolve_path(base, dir),
            None => cwd.to_path_buf(),
        };

        let templates_dir = file.paths.templates.as_deref().map(|dir| resolve_path(base, dir));

        let timezone = match file.stream.timezone {
            Some(ref name) => parse_zone(name).map_err(|e| ConfigError::Invalid {
                key: "stream.timezone",
                message: e.to_string(),
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let defaults = HttpSettings::default();
        let http = HttpSettings {
            connect_timeout: file
                .http
                .connect_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            request_timeout: file
                .http
                .request_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        };

        Ok(Self {
            config_file: None,
            cache_dir,
            output_dir,
            templates_dir,
            nextcloud: file.nextcloud,
            ignored_parent_ids: file.bookmarks.ignored_parent_ids.into_iter().collect(),
            wallabag: file.wallabag,
            feed_url: file.feed.url,
            timezone,
            date_format: file
                .stream
                .date_format
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            http,
        })
    }

    // ========================================================================
    // Per-command sections
    // ========================================================================

    /// Bookmark API credentials (the Nextcloud account)
    pub fn bookmark_settings(&self) -> Result<BookmarkSettings, ConfigError> {
        Ok(BookmarkSettings {
            host: required(&self.nextcloud.host, "nextcloud.host", "NEXTCLOUD_HOST")?,
            username: required(&self.nextcloud.username, "nextcloud.username", "NEXTCLOUD_USERNAME")?,
            password: required(&self.nextcloud.password, "nextcloud.password", "NEXTCLOUD_PASSWORD")?,
        })
    }

    /// Upload target for finished documents
    pub fn webdav_settings(&self) -> Result<WebDavSettings, ConfigError> {
        let account = self.bookmark_settings()?;
        Ok(WebDavSettings {
            host: account.host,
            username: account.username,
            password: account.password,
            upload_dir: required(&self.nextcloud.upload_dir, "nextcloud.upload_dir", "NEXTCLOUD_UPLOAD_DIR")?,
        })
    }

    /// Archive service credentials
    pub fn archive_settings(&self) -> Result<ArchiveSettings, ConfigError> {
        let w = &self.wallabag;
        Ok(ArchiveSettings {
            host: required(&w.host, "wallabag.host", "WALLABAG_HOST")?,
            client_id: required(&w.client_id, "wallabag.client_id", "WALLABAG_CLIENT_ID")?,
            client_secret: required(&w.client_secret, "wallabag.client_secret", "WALLABAG_CLIENT_SECRET")?,
            username: required(&w.username, "wallabag.username", "WALLABAG_USERNAME")?,
            password: required(&w.password, "wallabag.password", "WALLABAG_PASSWORD")?,
            delay: w
                .publish_delay_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PUBLISH_DELAY),
        })
    }

    /// Published-articles feed URL
    pub fn feed_url(&self) -> Result<String, ConfigError> {
        required(&self.feed_url, "feed.url", "FEED_URL")
    }

    /// Date rendering in the configured timezone
    pub fn date_style(&self) -> DateStyle {
        DateStyle::new(self.timezone, self.date_format.clone())
    }

    /// Cache store rooted at the cache directory
    pub fn cache_store(&self) -> CacheStore {
        CacheStore::new(&self.cache_dir)
    }
}
