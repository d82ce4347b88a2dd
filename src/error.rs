// src/error.rs

//! Unified error handling for the content pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Multi-status document could not be parsed
    #[error("XML error in response from {url}: {message}")]
    Xml { url: String, message: String },

    /// Front matter is not valid YAML
    #[error("{file}: invalid front matter: {message}")]
    FrontMatter { file: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server answered with a non-success status
    #[error("{method} failed ({status}) for {url}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Response body could not be read, even after retrying
    #[error("Failed to read response body for {method} {url} (status {status}) after {attempts} attempt(s): {message}")]
    BodyRead {
        method: String,
        url: String,
        status: u16,
        attempts: u32,
        message: String,
    },

    /// A computed local path would land outside its root
    #[error("Refusing to write outside {}: {relative}", .root.display())]
    PathEscape { root: PathBuf, relative: String },

    /// The local posts directory does not exist or is not a directory
    #[error("Missing local posts directory ({}). Run `fetch` first.", .0.display())]
    MissingPostsDir(PathBuf),

    /// The local posts directory holds no Markdown
    #[error("No markdown files found in {}/. Run `fetch` first.", .0.display())]
    NoMarkdownFiles(PathBuf),

    /// A required front-matter field is absent, blank or of the wrong type
    #[error("{file}: missing or invalid {field}")]
    MissingField { file: String, field: &'static str },

    /// A date field is present but cannot be parsed
    #[error("{file}: invalid {field} date: {value}")]
    InvalidDate {
        file: String,
        field: &'static str,
        value: String,
    },

    /// Two posts declare the same slug
    #[error("slug conflict: {slug} ({first} vs {second})")]
    SlugConflict {
        slug: String,
        first: String,
        second: String,
    },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an XML parse error for a response.
    pub fn xml(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Xml {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a path-escape error.
    pub fn path_escape(root: impl Into<PathBuf>, relative: impl Into<String>) -> Self {
        Self::PathEscape {
            root: root.into(),
            relative: relative.into(),
        }
    }
}
