// src/services/mod.rs

//! Remote services.
//!
//! - `webdav`: authenticated PROPFIND/GET with body-read retries
//! - `multistatus`: parsing of `207 Multi-Status` listings
//! - `tree`: recursive mirroring of a Markdown tree

pub mod multistatus;
pub mod tree;
pub mod webdav;

pub use tree::{MarkdownTreeCrawler, download_tree};
pub use webdav::{DavTransport, WebDavClient};
