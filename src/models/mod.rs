// src/models/mod.rs

//! Domain models for the content pipeline.
//!
//! This module contains the data structures shared across the crate,
//! organized by their primary purpose.

mod config;
mod post;
mod remote;

// Re-export all public types
pub use config::{
    Config, Credentials, HttpConfig, PathsConfig, RemoteSource, WebDavConfig, env,
    normalize_directory_url, normalize_subdir,
};
pub use post::{PostRecord, PostsIndex, iso_instant};
pub use remote::{CrawlStats, Depth, RemoteEntry};
