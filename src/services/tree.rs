// src/services/tree.rs

//! Markdown tree crawler.
//!
//! Mirrors every `.md` resource below a WebDAV collection into a local directory,
//! keeping relative paths. Collections are listed one level at a time (`Depth: 1`)
//! because many servers refuse `Depth: infinity`.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::Result;
use crate::models::{CrawlStats, Depth, RemoteEntry};
use crate::services::webdav::DavTransport;
use crate::utils::fs::safe_join;
use crate::utils::url::{ensure_trailing_slash, relative_path, resolve_same_origin};

/// Where a listed member should go.
enum Plan {
    Descend(Url),
    Download { url: Url, relative: String },
    Skip,
}

/// Service for mirroring a remote Markdown tree.
pub struct MarkdownTreeCrawler<'a> {
    transport: &'a dyn DavTransport,
    root: Url,
}

impl<'a> MarkdownTreeCrawler<'a> {
    /// Create a crawler rooted at the collection `root`.
    pub fn new(transport: &'a dyn DavTransport, root: &Url) -> Self {
        Self {
            transport,
            root: ensure_trailing_slash(root),
        }
    }

    /// Download the whole tree into `destination`.
    ///
    /// Requests are issued one at a time. Members outside the root collection are
    /// skipped; a destination path outside `destination` aborts the crawl.
    pub async fn download_tree(&self, destination: &Path) -> Result<CrawlStats> {
        let mut stats = CrawlStats::default();
        let mut queue = VecDeque::from([self.root.clone()]);
        let mut visited = HashSet::new();

        while let Some(collection) = queue.pop_front() {
            if !visited.insert(collection.path().to_string()) {
                continue;
            }
            stats.collections_visited += 1;

            let members = self.transport.propfind(&collection, Depth::One).await?;
            for member in members.iter().filter(|m| m.is_candidate()) {
                match self.plan(&collection, member, &mut stats) {
                    Plan::Descend(url) => queue.push_back(url),
                    Plan::Download { url, relative } => {
                        let path = self.download(&url, &relative, destination).await?;
                        log::debug!("Downloaded {} -> {}", url, path.display());
                        stats.files_downloaded += 1;
                    }
                    Plan::Skip => {}
                }
            }
        }

        Ok(stats)
    }

    fn plan(&self, collection: &Url, member: &RemoteEntry, stats: &mut CrawlStats) -> Plan {
        let url = match resolve_same_origin(&self.root, collection, &member.href) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Skipping unresolvable href {:?}: {}", member.href, e);
                stats.members_skipped += 1;
                return Plan::Skip;
            }
        };

        // The listing includes the collection itself.
        if ensure_trailing_slash(&url).path() == collection.path() {
            return Plan::Skip;
        }

        let Some(relative) = relative_path(&self.root, &url) else {
            log::warn!("Skipping {} outside of {}", url, self.root);
            stats.members_skipped += 1;
            return Plan::Skip;
        };
        if relative.is_empty() {
            return Plan::Skip;
        }

        if member.is_collection {
            return Plan::Descend(ensure_trailing_slash(&url));
        }

        if !relative.to_lowercase().ends_with(".md") {
            return Plan::Skip;
        }

        Plan::Download { url, relative }
    }

    async fn download(&self, url: &Url, relative: &str, destination: &Path) -> Result<PathBuf> {
        let path = safe_join(destination, relative)?;
        let content = self.transport.get_text(url).await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }
}

/// Mirror the Markdown tree under `root` into `destination`.
pub async fn download_tree(
    transport: &dyn DavTransport,
    root: &Url,
    destination: &Path,
) -> Result<CrawlStats> {
    MarkdownTreeCrawler::new(transport, root)
        .download_tree(destination)
        .await
}
