//! Post index data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated post, one per Markdown file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub title: String,

    /// Unique across one indexing pass
    pub slug: String,

    /// Normalized `YYYY-MM-DDTHH:MM:SS.mmmZ`
    pub created_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Never an empty list; absent instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,

    /// Forward-slash path relative to the posts root
    pub source_path: String,
}

/// The document written to `posts-index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsIndex {
    pub generated_at: String,
    pub posts: Vec<PostRecord>,
}

impl PostsIndex {
    /// Build an index stamped with the current instant.
    ///
    /// Records are sorted newest first. The sort is stable, so posts sharing a
    /// `createdAt` keep their input order.
    pub fn new(mut posts: Vec<PostRecord>) -> Self {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            generated_at: iso_instant(&Utc::now()),
            posts,
        }
    }
}

/// Format an instant as ISO-8601 UTC with millisecond precision and a `Z` suffix.
pub fn iso_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
