//! Front-matter extraction.
//!
//! A document may open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! date: June 3 2021
//! featured: true
//! ---
//! A short teaser.
//! ---
//! # Hello World
//! ...
//! ```
//!
//! The teaser before the first excerpt separator line (also `---` by
//! default) becomes the excerpt. The separator stays in the content; the
//! entry builder only keeps text from the first heading onward.

use crate::error::{BlogError, BlogResult};
use crate::utils::date::parse_date;
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::path::Path;

const DELIMITER: &str = "---";

/// A markdown document split into metadata, content and excerpt.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub data: Map<String, Value>,
    pub content: String,
    pub excerpt: String,
}

/// A document with entry-specific fields lifted out of its metadata.
#[derive(Debug, Clone)]
pub struct EntryDocument {
    pub doc: Document,
    /// The `date` field as written.
    pub published: String,
    /// `None` only for optional or hidden documents.
    pub date: Option<NaiveDateTime>,
    pub featured: bool,
    pub hidden: bool,
}

/// Split `source` into its raw YAML block and the remaining content.
///
/// Returns an empty block when the document has no front matter or the
/// block is never closed.
pub fn split(source: &str) -> (&str, &str) {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let Some(rest) = source.strip_prefix(DELIMITER) else {
        return ("", source);
    };
    let Some(rest) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) else {
        return ("", source);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return (&rest[..offset], &rest[offset + line.len()..]);
        }
        offset += line.len();
    }

    ("", source)
}

/// Text preceding the first `separator` line, if there is one.
pub fn excerpt(content: &str, separator: &str) -> Option<String> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim_end() == separator {
            return Some(content[..offset].trim().to_owned());
        }
        offset += line.len();
    }
    None
}

/// Parse a document without any date requirements (pages).
pub fn parse_document(source: &str, path: &Path, separator: &str) -> BlogResult<Document> {
    let (yaml, content) = split(source);
    let data = parse_yaml(yaml, path)?;

    // A document may pick its own separator
    let separator = data
        .get("excerpt_separator")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(separator);

    let excerpt = data
        .get("excerpt")
        .and_then(value_text)
        .or_else(|| excerpt(content, separator))
        .unwrap_or_default();

    Ok(Document {
        data,
        content: content.to_owned(),
        excerpt,
    })
}

/// Parse an entry, lifting `date`, `featured` and `hidden` out of its metadata.
///
/// The raw `date` text is kept as `published`. Unless `optional` is set or the
/// entry is hidden, a missing or unparseable date is an error naming the file.
pub fn parse_entry(
    source: &str,
    path: &Path,
    separator: &str,
    optional: bool,
) -> BlogResult<EntryDocument> {
    let doc = parse_document(source, path, separator)?;

    let published = doc.data.get("date").and_then(value_text).unwrap_or_default();
    let date = parse_date(&published);
    let featured = doc.data.get("featured").is_some_and(truthy);
    let hidden = doc.data.get("hidden").is_some_and(truthy);

    if date.is_none() && !optional && !hidden {
        return Err(BlogError::parse(path, "not dated"));
    }

    Ok(EntryDocument {
        doc,
        published,
        date,
        featured,
        hidden,
    })
}

fn parse_yaml(yaml: &str, path: &Path) -> BlogResult<Map<String, Value>> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }

    let value: Value = serde_yaml_ng::from_str(yaml)
        .map_err(|e| BlogError::parse(path, format!("bad front matter: {e}")))?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(BlogError::parse(path, "front matter must be a mapping")),
    }
}

/// Textual form of a scalar metadata value.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}
