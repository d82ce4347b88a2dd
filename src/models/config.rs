//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote WebDAV store settings
    #[serde(default)]
    pub webdav: WebDavConfig,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Local directory layout
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay values taken from environment variables.
    ///
    /// `lookup` is usually `|name| std::env::var(name).ok()`; it is a parameter so the
    /// environment is read once at the process boundary and nowhere else.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = non_empty(env::WEBDAV_URL) {
            self.webdav.url = Some(url);
        }
        if let Some(username) = non_empty(env::USERNAME) {
            self.webdav.username = Some(username);
        }
        if let Some(password) = non_empty(env::APP_PASSWORD) {
            self.webdav.app_password = Some(password);
        }
        if let Some(subdir) = lookup(env::POSTS_SUBDIR) {
            self.webdav.posts_subdir = subdir;
        }
        if let Some(dir) = non_empty(env::LOCAL_POSTS_DIR) {
            self.paths.posts_dir = PathBuf::from(dir);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        if self.http.max_attempts == 0 {
            return Err(AppError::config("http.max_attempts must be > 0"));
        }
        if self.paths.posts_dir.as_os_str().is_empty() {
            return Err(AppError::config("paths.posts_dir is empty"));
        }
        if self.paths.content_dir.as_os_str().is_empty() {
            return Err(AppError::config("paths.content_dir is empty"));
        }
        Ok(())
    }

    /// Absolute-or-relative path of the local posts mirror.
    pub fn posts_dir(&self) -> PathBuf {
        self.paths.root.join(&self.paths.posts_dir)
    }

    /// Path of the published content directory.
    pub fn content_dir(&self) -> PathBuf {
        self.paths.root.join(&self.paths.content_dir)
    }
}

/// Names of the environment variables understood by [`Config::apply_env`].
pub mod env {
    pub const WEBDAV_URL: &str = "NEXTCLOUD_BLOG_WEBDAV_URL";
    pub const USERNAME: &str = "NEXTCLOUD_USERNAME";
    pub const APP_PASSWORD: &str = "NEXTCLOUD_APP_PASSWORD";
    pub const POSTS_SUBDIR: &str = "NEXTCLOUD_POSTS_SUBDIR";
    pub const LOCAL_POSTS_DIR: &str = "LOCAL_POSTS_DIR";
}

/// Remote WebDAV store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDavConfig {
    /// Collection URL of the blog on the WebDAV server
    #[serde(default)]
    pub url: Option<String>,

    /// Account name for Basic authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Application-scoped password for Basic authentication
    #[serde(default)]
    pub app_password: Option<String>,

    /// Collection under `url` holding the posts
    #[serde(default = "defaults::posts_subdir")]
    pub posts_subdir: String,
}

impl Default for WebDavConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            app_password: None,
            posts_subdir: defaults::posts_subdir(),
        }
    }
}

impl WebDavConfig {
    /// Resolve the settings needed to talk to the server.
    ///
    /// Fails before any network activity when a value is missing or the URL carries
    /// credentials of its own.
    pub fn resolve(&self) -> Result<RemoteSource> {
        let raw_url = required(&self.url, env::WEBDAV_URL, "webdav.url")?;
        let username = required(&self.username, env::USERNAME, "webdav.username")?;
        let app_password = required(
            &self.app_password,
            env::APP_PASSWORD,
            "webdav.app_password",
        )?;

        let base = normalize_directory_url(Url::parse(raw_url)?);
        if !base.username().is_empty() || base.password().is_some() {
            return Err(AppError::config(format!(
                "{} must not include credentials (use {} / {})",
                env::WEBDAV_URL,
                env::USERNAME,
                env::APP_PASSWORD
            )));
        }

        let posts_url = base.join(&normalize_subdir(&self.posts_subdir))?;

        Ok(RemoteSource {
            posts_url,
            credentials: Credentials {
                username: username.to_string(),
                app_password: app_password.to_string(),
            },
        })
    }
}

fn required<'a>(value: &'a Option<String>, env_name: &str, key: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::config(format!("Missing required setting: {key} ({env_name})")))
}

/// Ensure a collection URL ends in `/` so relative joins stay inside it.
pub fn normalize_directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Normalize the posts sub-collection to `""` or `"segment/.../"`.
pub fn normalize_subdir(subdir: &str) -> String {
    let trimmed = subdir.trim();
    if matches!(trimmed, "" | "." | "./") {
        return String::new();
    }

    let without_leading = trimmed.trim_start_matches('/');
    if without_leading.is_empty() {
        return String::new();
    }

    if without_leading.ends_with('/') {
        without_leading.to_string()
    } else {
        format!("{without_leading}/")
    }
}

/// HTTP Basic credentials.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub app_password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("app_password", &"***")
            .finish()
    }
}

/// Fully resolved remote location of the posts tree.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    pub posts_url: Url,
    pub credentials: Credentials,
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts allowed when a response body cannot be read
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base backoff between attempts, multiplied by the attempt number
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            retry_backoff_ms: defaults::retry_backoff(),
        }
    }
}

/// Local directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory every other path is relative to
    #[serde(default = "defaults::root")]
    pub root: PathBuf,

    /// Local mirror of the remote posts tree
    #[serde(default = "defaults::posts_dir")]
    pub posts_dir: PathBuf,

    /// Published content directory consumed by the frontend
    #[serde(default = "defaults::content_dir")]
    pub content_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: defaults::root(),
            posts_dir: defaults::posts_dir(),
            content_dir: defaults::content_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn posts_subdir() -> String {
        "posts/".into()
    }

    pub fn user_agent() -> String {
        concat!("content-pipeline/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_backoff() -> u64 {
        150
    }

    pub fn root() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn posts_dir() -> PathBuf {
        PathBuf::from("posts")
    }
    pub fn content_dir() -> PathBuf {
        PathBuf::from("public/content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn remote_config(url: &str) -> WebDavConfig {
        WebDavConfig {
            url: Some(url.to_string()),
            username: Some("alice".into()),
            app_password: Some("secret".into()),
            posts_subdir: "posts/".into(),
        }
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.http.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [webdav]
            url = "https://cloud.example.com/dav/blog"

            [http]
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.max_attempts, 3);
        assert_eq!(config.webdav.posts_subdir, "posts/");
        assert_eq!(config.paths.content_dir, PathBuf::from("public/content"));
    }

    #[test]
    fn env_overlay_replaces_values() {
        let vars: HashMap<&str, &str> = [
            (env::WEBDAV_URL, "https://dav.example.com/blog/"),
            (env::USERNAME, "bob"),
            (env::APP_PASSWORD, "pw"),
            (env::POSTS_SUBDIR, "articles"),
            (env::LOCAL_POSTS_DIR, "content"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.webdav.username.as_deref(), Some("bob"));
        assert_eq!(config.webdav.posts_subdir, "articles");
        assert_eq!(config.paths.posts_dir, PathBuf::from("content"));
    }

    #[test]
    fn resolve_joins_posts_subdir() {
        let source = remote_config("https://dav.example.com/files/alice/blog")
            .resolve()
            .unwrap();
        assert_eq!(
            source.posts_url.as_str(),
            "https://dav.example.com/files/alice/blog/posts/"
        );
    }

    #[test]
    fn resolve_rejects_embedded_credentials() {
        let err = remote_config("https://alice:pw@dav.example.com/blog/")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("must not include credentials"));
    }

    #[test]
    fn resolve_requires_password() {
        let mut config = remote_config("https://dav.example.com/blog/");
        config.app_password = None;
        let err = config.resolve().unwrap_err();
        assert!(err.to_string().contains("webdav.app_password"));
    }

    #[test]
    fn normalize_subdir_variants() {
        assert_eq!(normalize_subdir(""), "");
        assert_eq!(normalize_subdir(" ./ "), "");
        assert_eq!(normalize_subdir("///"), "");
        assert_eq!(normalize_subdir("/posts"), "posts/");
        assert_eq!(normalize_subdir("a/b/"), "a/b/");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "alice".into(),
            app_password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
