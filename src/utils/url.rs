// src/utils/url.rs

//! URL manipulation utilities for walking a WebDAV tree.

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::Result;

/// Resolve a server-supplied href and pin it to the root's origin.
///
/// The href is resolved against the collection it was listed in; only its path,
/// query and fragment are kept and reattached to `root`'s scheme, host and port.
///
/// # Examples
/// ```
/// use content_pipeline::utils::url::resolve_same_origin;
/// use url::Url;
///
/// let root = Url::parse("https://dav.example.com/blog/").unwrap();
/// let current = Url::parse("https://dav.example.com/blog/2024/").unwrap();
/// let resolved = resolve_same_origin(&root, &current, "http://internal:8080/blog/2024/a.md").unwrap();
/// assert_eq!(resolved.as_str(), "https://dav.example.com/blog/2024/a.md");
/// ```
pub fn resolve_same_origin(root: &Url, current: &Url, href: &str) -> Result<Url> {
    let resolved = current.join(href)?;
    let mut pinned = root.clone();
    pinned.set_path(resolved.path());
    pinned.set_query(resolved.query());
    pinned.set_fragment(resolved.fragment());
    Ok(pinned)
}

/// Return `url` with a trailing `/` on its path.
pub fn ensure_trailing_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        return url.clone();
    }
    let mut copy = url.clone();
    let path = format!("{}/", url.path());
    copy.set_path(&path);
    copy
}

/// Decoded path of `url` relative to the collection `root`.
///
/// `None` when the path is outside the root or does not decode to UTF-8. An empty
/// string means `url` is the root collection itself.
pub fn relative_path(root: &Url, url: &Url) -> Option<String> {
    let root_path = root.path();
    let prefix = if root_path.ends_with('/') {
        root_path.to_string()
    } else {
        format!("{root_path}/")
    };

    let encoded = url.path().strip_prefix(prefix.as_str())?;
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}
