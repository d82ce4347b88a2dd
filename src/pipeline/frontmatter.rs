//! Front-matter splitting.
//!
//! A front-matter block is a YAML document between a `---` line at the very top of
//! the file and the next `---` line.

use serde_yaml::{Mapping, Value};

use crate::error::{AppError, Result};

const FENCE: &str = "---";

/// Metadata fields from a front-matter block.
#[derive(Debug, Clone, Default)]
pub struct FrontMatter {
    pub fields: Mapping,
}

impl FrontMatter {
    /// Raw value of a field, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}

/// Split `text` into the front-matter source (if any) and the body.
///
/// A block that is never closed is not front matter.
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, text);
    };
    if !is_fence(first) {
        return (None, text);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if is_fence(line) {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    (None, text)
}

/// Remove a leading front-matter block, returning the Markdown body.
pub fn strip_front_matter(text: &str) -> &str {
    split_front_matter(text).1
}

/// Parse the front matter of a file. Files without a block yield no fields.
///
/// A block that is valid YAML but not a mapping is treated as empty, so the
/// required-field checks report what is missing.
pub fn parse_front_matter(file: &str, text: &str) -> Result<FrontMatter> {
    let (yaml, _) = split_front_matter(text);

    let fields = match yaml {
        Some(source) if !source.trim().is_empty() => {
            let value: Value =
                serde_yaml::from_str(source).map_err(|e| AppError::FrontMatter {
                    file: file.to_string(),
                    message: e.to_string(),
                })?;
            match value {
                Value::Mapping(map) => map,
                other => {
                    log::debug!("{file}: front matter is not a mapping: {other:?}");
                    Mapping::new()
                }
            }
        }
        _ => Mapping::new(),
    };

    Ok(FrontMatter { fields })
}
