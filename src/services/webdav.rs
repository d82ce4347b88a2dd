// src/services/webdav.rs

//! WebDAV client.
//!
//! Issues authenticated PROPFIND/GET requests. Reading a response body is retried
//! when the connection drops mid-read; every other failure is reported at once.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONNECTION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Credentials, Depth, HttpConfig, RemoteEntry};
use crate::services::multistatus::parse_multistatus;
use crate::utils::http::create_async_client;

const PROPFIND_BODY: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<d:propfind xmlns:d="DAV:">"#,
    "<d:prop><d:resourcetype/></d:prop>",
    "</d:propfind>"
);

/// Operations the tree crawler needs from a WebDAV server.
#[async_trait]
pub trait DavTransport: Send + Sync {
    /// List a collection (`Depth: 1`) or describe a single resource (`Depth: 0`).
    async fn propfind(&self, url: &Url, depth: Depth) -> Result<Vec<RemoteEntry>>;

    /// Download a resource as text.
    async fn get_text(&self, url: &Url) -> Result<String>;
}

/// Stateless WebDAV client using HTTP Basic authentication.
#[derive(Debug, Clone)]
pub struct WebDavClient {
    client: Client,
    authorization: HeaderValue,
    propfind: Method,
    max_attempts: u32,
    backoff: Duration,
}

impl WebDavClient {
    /// Create a client from HTTP settings and account credentials.
    pub fn new(config: &HttpConfig, credentials: &Credentials) -> Result<Self> {
        let client = create_async_client(config)?;
        Self::with_client(
            client,
            credentials,
            config.max_attempts,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// Wrap an existing `reqwest` client.
    pub fn with_client(
        client: Client,
        credentials: &Credentials,
        max_attempts: u32,
        backoff: Duration,
    ) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&basic_auth(credentials))
            .map_err(|e| AppError::config(format!("Invalid credentials: {e}")))?;
        authorization.set_sensitive(true);

        let propfind = Method::from_bytes(b"PROPFIND")
            .map_err(|e| AppError::config(format!("Invalid HTTP method: {e}")))?;

        Ok(Self {
            client,
            authorization,
            propfind,
            max_attempts: max_attempts.max(1),
            backoff,
        })
    }

    /// Send one authenticated request and return the raw response.
    pub async fn request(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&str>,
    ) -> Result<Response> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .headers(headers.clone());
        if let Some(body) = body {
            request = request.body(body.to_string());
        }
        Ok(request.send().await?)
    }

    /// Send a request and read the whole body as text.
    ///
    /// When the body cannot be read the request is sent again, after waiting
    /// `backoff × attempt`, with `Connection: close` so a fresh connection is used.
    /// Failures before a response arrives are not retried. A non-2xx status fails
    /// immediately with the body text.
    pub async fn request_text(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&str>,
    ) -> Result<String> {
        let mut attempt: u32 = 1;

        loop {
            let mut attempt_headers = headers.clone();
            if attempt > 1 {
                attempt_headers.insert(CONNECTION, HeaderValue::from_static("close"));
            }

            let response = self.request(method, url, &attempt_headers, body).await?;
            let status = response.status();

            match response.text().await {
                Ok(text) if status.is_success() => return Ok(text),
                Ok(text) => {
                    return Err(AppError::Status {
                        method: method.to_string(),
                        url: url.to_string(),
                        status: status.as_u16(),
                        body: text,
                    });
                }
                Err(e) if is_body_failure(&e) && attempt < self.max_attempts => {
                    log::debug!(
                        "Retrying {} {} after body read error (attempt {}/{}): {}",
                        method,
                        url,
                        attempt,
                        self.max_attempts,
                        e
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(AppError::BodyRead {
                        method: method.to_string(),
                        url: url.to_string(),
                        status: status.as_u16(),
                        attempts: attempt,
                        message: error_chain(&e),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl DavTransport for WebDavClient {
    async fn propfind(&self, url: &Url, depth: Depth) -> Result<Vec<RemoteEntry>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("depth"),
            HeaderValue::from_static(depth.as_str()),
        );
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/xml; charset=utf-8"),
        );

        let xml = self
            .request_text(&self.propfind, url, &headers, Some(PROPFIND_BODY))
            .await?;
        let entries = parse_multistatus(url.as_str(), &xml)?;

        log::debug!("PROPFIND {} depth={} -> {} items", url, depth, entries.len());
        Ok(entries)
    }

    async fn get_text(&self, url: &Url) -> Result<String> {
        self.request_text(&Method::GET, url, &HeaderMap::new(), None)
            .await
    }
}

/// `Basic base64(username:password)`.
pub fn basic_auth(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.username, credentials.app_password);
    format!("Basic {}", STANDARD.encode(raw))
}

/// Errors raised while streaming a body whose headers already arrived.
fn is_body_failure(e: &reqwest::Error) -> bool {
    e.is_body() || e.is_decode()
}

fn error_chain(e: &dyn StdError) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
