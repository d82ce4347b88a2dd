// src/pipeline/validate.rs

//! Front-matter coercion and post validation.
//!
//! Fields are read leniently: optional values of the wrong type are dropped, while the
//! required `title`, `slug` and `createdAt` must be usable or the file is rejected.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_yaml::Value;

use crate::error::{AppError, Result};
use crate::models::{PostRecord, iso_instant};
use crate::pipeline::frontmatter::{FrontMatter, parse_front_matter};

/// Naive datetime layouts, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S %z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Unwrap YAML tags such as `!!timestamp 2024-01-01`.
fn untagged(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untagged(&tagged.value),
        other => other,
    }
}

/// A trimmed, non-empty string, or `None`.
pub fn as_optional_string(value: Option<&Value>) -> Option<String> {
    match value.map(untagged) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// The string elements of a sequence, trimmed and non-empty, or `None` when none remain.
pub fn as_optional_string_array(value: Option<&Value>) -> Option<Vec<String>> {
    let Some(Value::Sequence(items)) = value.map(untagged) else {
        return None;
    };

    let strings: Vec<String> = items
        .iter()
        .filter_map(|item| as_optional_string(Some(item)))
        .collect();

    (!strings.is_empty()).then_some(strings)
}

/// Parse a date or datetime string into an instant.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt.and_utc());
        }
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    DateTime::parse_from_rfc2822(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize a required date field to `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn to_iso_date(value: Option<&Value>, field: &'static str, file: &str) -> Result<String> {
    let Some(Value::String(raw)) = value.map(untagged) else {
        return Err(AppError::MissingField {
            file: file.to_string(),
            field,
        });
    };
    if raw.trim().is_empty() {
        return Err(AppError::MissingField {
            file: file.to_string(),
            field,
        });
    }

    parse_date(raw)
        .map(|instant| iso_instant(&instant))
        .ok_or_else(|| AppError::InvalidDate {
            file: file.to_string(),
            field,
            value: raw.clone(),
        })
}

/// Normalize an optional date field. Absent, null and empty values yield `None`.
pub fn to_optional_iso_date(
    value: Option<&Value>,
    field: &'static str,
    file: &str,
) -> Result<Option<String>> {
    match value.map(untagged) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(_) => to_iso_date(value, field, file).map(Some),
    }
}

fn required_string(front_matter: &FrontMatter, field: &'static str, file: &str) -> Result<String> {
    as_optional_string(front_matter.get(field)).ok_or_else(|| AppError::MissingField {
        file: file.to_string(),
        field,
    })
}

/// Slugs claimed so far in one indexing pass, with the file that claimed each.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    owners: HashMap<String, String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `slug` for `source_path`, failing if another file already holds it.
    pub fn claim(&mut self, slug: &str, source_path: &str) -> Result<()> {
        if let Some(first) = self.owners.get(slug) {
            return Err(AppError::SlugConflict {
                slug: slug.to_string(),
                first: first.clone(),
                second: source_path.to_string(),
            });
        }
        self.owners.insert(slug.to_string(), source_path.to_string());
        Ok(())
    }
}

/// Build a post record from parsed front matter.
///
/// Fields are checked in order: `title`, `slug` (including uniqueness), `createdAt`,
/// then `updatedAt`.
pub fn build_record(
    front_matter: &FrontMatter,
    source_path: &str,
    slugs: &mut SlugRegistry,
) -> Result<PostRecord> {
    let title = required_string(front_matter, "title", source_path)?;
    let slug = required_string(front_matter, "slug", source_path)?;
    slugs.claim(&slug, source_path)?;
    let created_at = to_iso_date(front_matter.get("createdAt"), "createdAt", source_path)?;
    let updated_at =
        to_optional_iso_date(front_matter.get("updatedAt"), "updatedAt", source_path)?;

    Ok(PostRecord {
        title,
        slug,
        created_at,
        updated_at,
        summary: as_optional_string(front_matter.get("summary")),
        tags: as_optional_string_array(front_matter.get("tags")),
        category: as_optional_string(front_matter.get("category")),
        cover: as_optional_string(front_matter.get("cover")),
        source_path: source_path.to_string(),
    })
}

/// Parse and validate one Markdown file.
pub fn parse_post(
    source_path: &str,
    text: &str,
    slugs: &mut SlugRegistry,
) -> Result<PostRecord> {
    let front_matter = parse_front_matter(source_path, text)?;
    build_record(&front_matter, source_path, slugs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::post;

    fn yaml(source: &str) -> Value {
        serde_yaml::from_str(source).unwrap()
    }

    #[test]
    fn test_date_only_is_utc_midnight() {
        let value = yaml("'2024-01-15'");
        assert_eq!(
            to_iso_date(Some(&value), "createdAt", "a.md").unwrap(),
            "2024-01-15T00:00:00.000Z"
        );
    }

    #[test]
    fn test_datetime_with_offset_is_converted() {
        let value = yaml("'2024-01-15T10:30:00+02:00'");
        assert_eq!(
            to_iso_date(Some(&value), "createdAt", "a.md").unwrap(),
            "2024-01-15T08:30:00.000Z"
        );
    }

    #[test]
    fn test_naive_datetime_is_utc() {
        let value = yaml("'2024-03-01 09:15:30'");
        assert_eq!(
            to_iso_date(Some(&value), "createdAt", "a.md").unwrap(),
            "2024-03-01T09:15:30.000Z"
        );
    }

    #[test]
    fn test_unquoted_yaml_date() {
        let value = yaml("2024-01-15");
        assert_eq!(
            to_iso_date(Some(&value), "createdAt", "a.md").unwrap(),
            "2024-01-15T00:00:00.000Z"
        );
    }

    #[test]
    fn test_invalid_date() {
        let value = yaml("invalid-date");
        let err = to_iso_date(Some(&value), "createdAt", "test.md").unwrap_err();
        assert_eq!(err.to_string(), "test.md: invalid createdAt date: invalid-date");
    }

    #[test]
    fn test_missing_or_blank_date() {
        for value in [None, Some(yaml("''")), Some(yaml("'   '")), Some(yaml("42"))] {
            let err = to_iso_date(value.as_ref(), "createdAt", "test.md").unwrap_err();
            assert_eq!(err.to_string(), "test.md: missing or invalid createdAt");
        }
    }

    #[test]
    fn test_optional_date() {
        assert_eq!(to_optional_iso_date(None, "updatedAt", "a.md").unwrap(), None);
        assert_eq!(
            to_optional_iso_date(Some(&Value::Null), "updatedAt", "a.md").unwrap(),
            None
        );
        assert_eq!(
            to_optional_iso_date(Some(&yaml("''")), "updatedAt", "a.md").unwrap(),
            None
        );
        assert!(to_optional_iso_date(Some(&yaml("'  '")), "updatedAt", "a.md").is_err());
        assert_eq!(
            to_optional_iso_date(Some(&yaml("'2024-02-01'")), "updatedAt", "a.md").unwrap(),
            Some("2024-02-01T00:00:00.000Z".to_string())
        );
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(
            as_optional_string(Some(&yaml("'  Hello  '"))),
            Some("Hello".to_string())
        );
        assert_eq!(as_optional_string(Some(&yaml("'   '"))), None);
        assert_eq!(as_optional_string(Some(&yaml("42"))), None);
        assert_eq!(as_optional_string(None), None);
    }

    #[test]
    fn test_string_array_coercion() {
        assert_eq!(
            as_optional_string_array(Some(&yaml("['tag1', 123, 'tag2', null]"))),
            Some(vec!["tag1".to_string(), "tag2".to_string()])
        );
        assert_eq!(as_optional_string_array(Some(&yaml("[123, null]"))), None);
        assert_eq!(as_optional_string_array(Some(&yaml("[]"))), None);
        assert_eq!(as_optional_string_array(Some(&yaml("'tag'"))), None);
    }

    #[test]
    fn test_parse_full_post() {
        let text = post(
            "title: Hello World\nslug: hello-world\ncreatedAt: '2024-01-15'\n\
             updatedAt: '2024-01-20T12:00:00Z'\nsummary: '  Short  '\n\
             tags: [rust, '', web]\ncategory: notes\ncover: /img/a.png",
        );

        let record = parse_post("2024/hello.md", &text, &mut SlugRegistry::new()).unwrap();

        assert_eq!(record.title, "Hello World");
        assert_eq!(record.slug, "hello-world");
        assert_eq!(record.created_at, "2024-01-15T00:00:00.000Z");
        assert_eq!(record.updated_at.as_deref(), Some("2024-01-20T12:00:00.000Z"));
        assert_eq!(record.summary.as_deref(), Some("Short"));
        assert_eq!(
            record.tags,
            Some(vec!["rust".to_string(), "web".to_string()])
        );
        assert_eq!(record.category.as_deref(), Some("notes"));
        assert_eq!(record.cover.as_deref(), Some("/img/a.png"));
        assert_eq!(record.source_path, "2024/hello.md");
    }

    #[test]
    fn test_blank_summary_is_dropped() {
        let text = post("title: T\nslug: s\ncreatedAt: '2024-01-01'\nsummary: '   '");
        let record = parse_post("a.md", &text, &mut SlugRegistry::new()).unwrap();
        assert_eq!(record.summary, None);
    }

    #[test]
    fn test_missing_title() {
        let text = post("slug: s\ncreatedAt: '2024-01-01'");
        let err = parse_post("a.md", &text, &mut SlugRegistry::new()).unwrap_err();
        assert_eq!(err.to_string(), "a.md: missing or invalid title");
    }

    #[test]
    fn test_missing_slug() {
        let text = post("title: T\ncreatedAt: '2024-01-01'");
        let err = parse_post("a.md", &text, &mut SlugRegistry::new()).unwrap_err();
        assert_eq!(err.to_string(), "a.md: missing or invalid slug");
    }

    #[test]
    fn test_slug_conflict_reported_before_dates() {
        let mut slugs = SlugRegistry::new();
        let first = post("title: A\nslug: same\ncreatedAt: '2024-01-01'");
        let second = post("title: B\nslug: same\ncreatedAt: 'not a date'");

        parse_post("a.md", &first, &mut slugs).unwrap();
        let err = parse_post("b.md", &second, &mut slugs).unwrap_err();

        assert_eq!(err.to_string(), "slug conflict: same (a.md vs b.md)");
    }

    #[test]
    fn test_no_front_matter_reports_title() {
        let err =
            parse_post("plain.md", "# Just a heading\n", &mut SlugRegistry::new()).unwrap_err();
        assert_eq!(err.to_string(), "plain.md: missing or invalid title");
    }
}
