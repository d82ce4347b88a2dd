//! Remote tree listing types.

use std::fmt;

/// One member of a WebDAV collection listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Raw, percent-encoded href as sent by the server
    pub href: String,
    pub is_collection: bool,
}

impl RemoteEntry {
    /// Cheap pre-filter on the raw href: Markdown resources and all collections.
    pub fn is_candidate(&self) -> bool {
        self.is_collection || self.href.ends_with(".md")
    }
}

/// PROPFIND `Depth` header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
}

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected while mirroring a remote tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    pub collections_visited: usize,
    pub files_downloaded: usize,
    pub members_skipped: usize,
}
