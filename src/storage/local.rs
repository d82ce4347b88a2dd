//! Local staging directory.
//!
//! Every publish-style operation builds its output in a staging directory next to the
//! canonical one and swaps it in at the end.
//!
//! ## Published Content Layout
//!
//! ```text
//! {content_dir}/
//! ├── posts-index.json      # Serialized PostsIndex
//! └── posts/                # Copies of the source Markdown, same relative paths
//!     ├── hello.md
//!     └── 2024/
//!         └── trip.md
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::storage::atomic::{StagingPaths, remove_path};
use crate::utils::fs::safe_join;

/// A staging tree that is promoted over its target once complete.
#[derive(Debug, Clone)]
pub struct StagingDir {
    paths: StagingPaths,
}

impl StagingDir {
    /// Create a fresh, empty staging directory for `target`.
    ///
    /// Leftovers from an interrupted earlier run are removed first.
    pub async fn create(target: impl Into<PathBuf>) -> Result<Self> {
        let paths = StagingPaths::for_target(target)?;
        remove_path(&paths.staging).await?;
        tokio::fs::create_dir_all(&paths.staging).await?;
        log::debug!("Staging into {}", paths.staging.display());
        Ok(Self { paths })
    }

    /// Root of the staging tree.
    pub fn root(&self) -> &Path {
        &self.paths.staging
    }

    /// Resolve a forward-slash relative key inside the staging tree.
    pub fn path(&self, key: &str) -> Result<PathBuf> {
        safe_join(&self.paths.staging, key)
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes under a relative key, creating parent directories.
    pub async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key)?;
        Self::ensure_parent(&path).await?;

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(path)
    }

    /// Write pretty JSON followed by a newline.
    pub async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<PathBuf> {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        self.write_bytes(key, &bytes).await
    }

    /// Copy a local file under a relative key, byte for byte.
    pub async fn copy_file(&self, source: &Path, key: &str) -> Result<PathBuf> {
        let path = self.path(key)?;
        Self::ensure_parent(&path).await?;
        tokio::fs::copy(source, &path).await?;
        Ok(path)
    }

    /// Swap the staging tree into place, consuming it.
    pub async fn promote(self) -> Result<()> {
        self.paths.promote().await?;
        log::info!("Published {}", self.paths.target.display());
        Ok(())
    }

    /// Throw the staging tree away after a failed build.
    pub async fn discard(self) {
        if let Err(e) = remove_path(&self.paths.staging).await {
            log::warn!(
                "Could not remove staging directory {}: {}",
                self.paths.staging.display(),
                e
            );
        }
    }
}
