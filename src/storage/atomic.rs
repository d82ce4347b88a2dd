//! Atomic directory replacement.
//!
//! Publishes a fully prepared directory over a canonical one using two renames, so a
//! reader sees either the old tree or the new tree and never a mix:
//!
//! ```text
//! target   ──rename──▶ backup        (skipped when target is absent)
//! source   ──rename──▶ target
//! backup   ──remove
//! ```
//!
//! Renames are only atomic within one filesystem, so the three paths must be siblings on
//! the same mount. [`StagingPaths`] derives them that way.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

const STAGING_SUFFIX: &str = "__tmp__";
const BACKUP_SUFFIX: &str = "__backup__";

/// The staging and backup siblings of a canonical directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPaths {
    pub target: PathBuf,
    pub staging: PathBuf,
    pub backup: PathBuf,
}

impl StagingPaths {
    /// Derive `<name>.__tmp__` and `<name>.__backup__` next to `target`.
    pub fn for_target(target: impl Into<PathBuf>) -> Result<Self> {
        let target = target.into();
        let name = target
            .file_name()
            .ok_or_else(|| {
                AppError::config(format!(
                    "Cannot stage next to {}: path has no final component",
                    target.display()
                ))
            })?
            .to_string_lossy()
            .into_owned();

        let staging = target.with_file_name(format!("{name}.{STAGING_SUFFIX}"));
        let backup = target.with_file_name(format!("{name}.{BACKUP_SUFFIX}"));

        Ok(Self {
            target,
            staging,
            backup,
        })
    }

    /// Swap the staging directory into place.
    pub async fn promote(&self) -> Result<()> {
        replace_dir(&self.staging, &self.target, &self.backup).await
    }
}

/// Replace `target` with `source`.
///
/// On success `target` holds what `source` held and neither `source` nor `backup`
/// exist. If a rename fails the previous `target` is put back when a backup of it
/// exists, and the rename error is returned. Errors raised while cleaning up are logged
/// and dropped.
pub async fn replace_dir(source: &Path, target: &Path, backup: &Path) -> Result<()> {
    remove_path(backup).await?;

    match swap(source, target, backup).await {
        Ok(()) => {
            ignore_failure("remove backup directory", remove_path(backup)).await;
            log::debug!("Replaced {} with {}", target.display(), source.display());
            Ok(())
        }
        Err(err) => {
            log::warn!(
                "Replacing {} failed ({}); rolling back",
                target.display(),
                err
            );
            rollback(source, target, backup).await;
            Err(err.into())
        }
    }
}

async fn swap(source: &Path, target: &Path, backup: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(target, backup).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tokio::fs::rename(source, target).await
}

async fn rollback(source: &Path, target: &Path, backup: &Path) {
    ignore_failure("remove staging directory", remove_path(source)).await;

    // Without a backup the old target was never moved, so it is left untouched.
    if !path_exists(backup).await {
        return;
    }

    ignore_failure("restore previous directory", async {
        remove_path(target).await?;
        tokio::fs::rename(backup, target).await
    })
    .await;
}

/// Run a cleanup step whose failure must never replace the error being reported.
async fn ignore_failure<F>(what: &str, step: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = step.await {
        log::warn!("Ignoring failure to {what}: {e}");
    }
}

/// Remove a file or directory tree; a missing path is not an error.
pub async fn remove_path(path: &Path) -> std::io::Result<()> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}
