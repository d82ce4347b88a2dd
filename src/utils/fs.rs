//! File system utilities.

use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, Result};

/// Join a relative path onto `root`, refusing anything that would land outside it.
///
/// The check is lexical: `..` may only cancel a segment added by the same path, and
/// absolute paths are rejected outright.
pub fn safe_join(root: &Path, relative: &str) -> Result<PathBuf> {
    let mut joined = root.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => {
                joined.push(segment);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => {
                joined.pop();
                depth -= 1;
            }
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(AppError::path_escape(root, relative));
            }
        }
    }

    Ok(joined)
}

/// Recursively list `.md` files (extension matched case-insensitively).
///
/// Results are sorted by the full path string, so `a.md` precedes `a/b.md`.
pub async fn list_markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && is_markdown(&path) {
                files.push(path);
            }
        }
    }

    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(files)
}

/// Whether a path has a `.md` extension, ignoring case.
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Path of `path` relative to `root`, joined with `/` regardless of platform.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(segments.join("/"))
}
