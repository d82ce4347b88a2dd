// src/pipeline/generate.rs

//! Content indexing and publishing.
//!
//! Reads every Markdown file below the local posts mirror, validates its front matter,
//! and publishes `posts-index.json` together with verbatim copies of the sources.
//! Nothing is written until every file has validated.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{Config, PostsIndex};
use crate::pipeline::validate::{SlugRegistry, parse_post};
use crate::storage::StagingDir;
use crate::utils::fs::{list_markdown_files, relative_slash_path};
use crate::utils::log;

/// File name of the serialized index inside the content directory.
pub const INDEX_FILE: &str = "posts-index.json";

/// Subdirectory of the content directory holding copied sources.
pub const POSTS_SUBDIR: &str = "posts";

/// A Markdown file found under the posts root.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Forward-slash path relative to the posts root
    pub relative: String,
}

/// A validated index and the files it was built from.
#[derive(Debug, Clone)]
pub struct IndexedPosts {
    pub index: PostsIndex,
    pub sources: Vec<SourceFile>,
}

async fn discover(posts_root: &Path) -> Result<Vec<SourceFile>> {
    match tokio::fs::metadata(posts_root).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return Err(AppError::MissingPostsDir(posts_root.to_path_buf())),
    }

    let files = list_markdown_files(posts_root).await?;
    if files.is_empty() {
        return Err(AppError::NoMarkdownFiles(posts_root.to_path_buf()));
    }

    Ok(files
        .into_iter()
        .map(|path| {
            let relative = relative_slash_path(posts_root, &path)
                .unwrap_or_else(|| path.to_string_lossy().into_owned());
            SourceFile { path, relative }
        })
        .collect())
}

/// Read and validate every post under `posts_root` without writing anything.
pub async fn index_posts(posts_root: &Path) -> Result<IndexedPosts> {
    let sources = discover(posts_root).await?;

    let mut records = Vec::with_capacity(sources.len());
    let mut slugs = SlugRegistry::new();

    for source in &sources {
        let text = tokio::fs::read_to_string(&source.path).await?;
        let record = parse_post(&source.relative, &text, &mut slugs)?;

        ::log::debug!("Indexed {} as {}", source.relative, record.slug);
        records.push(record);
    }

    Ok(IndexedPosts {
        index: PostsIndex::new(records),
        sources,
    })
}

/// Write an index and its sources to `content_dir`, replacing it atomically.
pub async fn publish(indexed: &IndexedPosts, content_dir: &Path) -> Result<()> {
    let staging = StagingDir::create(content_dir).await?;

    match write_content(&staging, indexed).await {
        Ok(()) => staging.promote().await,
        Err(e) => {
            staging.discard().await;
            Err(e)
        }
    }
}

async fn write_content(staging: &StagingDir, indexed: &IndexedPosts) -> Result<()> {
    for source in &indexed.sources {
        let key = format!("{POSTS_SUBDIR}/{}", source.relative);
        staging.copy_file(&source.path, &key).await?;
    }
    staging.write_json(INDEX_FILE, &indexed.index).await?;
    Ok(())
}

/// Validate the posts under `posts_root` and publish them to `content_dir`.
pub async fn generate_content(posts_root: &Path, content_dir: &Path) -> Result<PostsIndex> {
    let indexed = index_posts(posts_root).await?;
    publish(&indexed, content_dir).await?;
    Ok(indexed.index)
}

/// Run the indexer with configured paths.
pub async fn run_generate(config: &Config) -> Result<PostsIndex> {
    let posts_dir = config.posts_dir();
    let content_dir = config.content_dir();
    log::header("Generating content index");
    log::sub_item(&format!("Posts: {}", posts_dir.display()));
    log::sub_item(&format!("Output: {}", content_dir.display()));

    let index = generate_content(&posts_dir, &content_dir).await?;

    log::success(&format!(
        "Generated {} with {} post(s)",
        content_dir.join(INDEX_FILE).display(),
        index.posts.len()
    ));
    Ok(index)
}

/// Validate the local posts without publishing.
pub async fn run_check(config: &Config) -> Result<PostsIndex> {
    let posts_dir = config.posts_dir();
    log::header("Checking posts");
    log::sub_item(&format!("Posts: {}", posts_dir.display()));

    let indexed = index_posts(&posts_dir).await?;
    for post in &indexed.index.posts {
        log::sub_item(&format!("{} ({}) {}", post.slug, post.created_at, post.source_path));
    }

    log::success(&format!("{} post(s) valid", indexed.index.posts.len()));
    Ok(indexed.index)
}
