// src/pipeline/fetch.rs

//! Mirror the remote posts tree into the local posts directory.

use std::path::Path;

use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, CrawlStats, Depth, RemoteEntry};
use crate::services::{DavTransport, WebDavClient, download_tree};
use crate::storage::StagingDir;
use crate::utils::log;

/// Download the tree at `posts_url` and swap it over `posts_dir`.
///
/// The previous mirror stays in place if any request fails.
pub async fn fetch_posts(
    transport: &dyn DavTransport,
    posts_url: &Url,
    posts_dir: &Path,
) -> Result<CrawlStats> {
    let staging = StagingDir::create(posts_dir).await?;

    match download_tree(transport, posts_url, staging.root()).await {
        Ok(stats) => {
            staging.promote().await?;
            Ok(stats)
        }
        Err(e) => {
            staging.discard().await;
            Err(e)
        }
    }
}

/// Fetch posts using configured credentials and paths.
pub async fn run_fetch(config: &Config) -> Result<CrawlStats> {
    let source = config.webdav.resolve()?;
    let posts_dir = config.posts_dir();

    log::header("Fetching posts");
    log::sub_item(&format!("Remote: {}", source.posts_url));
    log::sub_item(&format!("Local: {}", posts_dir.display()));

    let client = WebDavClient::new(&config.http, &source.credentials)?;
    let stats = fetch_posts(&client, &source.posts_url, &posts_dir).await?;

    log::summary(
        "Fetch",
        &[
            ("Collections", stats.collections_visited.to_string()),
            ("Files", stats.files_downloaded.to_string()),
            ("Skipped", stats.members_skipped.to_string()),
        ],
    );
    if stats.files_downloaded == 0 {
        log::warn(&format!("No markdown files found under {}", source.posts_url));
    }
    Ok(stats)
}

/// Confirm the configured posts collection exists and is reachable.
pub async fn check_remote(config: &Config) -> Result<RemoteEntry> {
    let source = config.webdav.resolve()?;
    log::header("Checking remote");
    log::sub_item(&format!("Remote: {}", source.posts_url));

    let client = WebDavClient::new(&config.http, &source.credentials)?;
    let entry = describe_collection(&client, &source.posts_url).await?;

    log::success(&format!("{} is reachable", source.posts_url));
    Ok(entry)
}

async fn describe_collection(transport: &dyn DavTransport, url: &Url) -> Result<RemoteEntry> {
    let entry = transport
        .propfind(url, Depth::Zero)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::xml(url.as_str(), "empty multi-status response"))?;

    if !entry.is_collection {
        return Err(AppError::config(format!("{url} is not a collection")));
    }
    Ok(entry)
}
