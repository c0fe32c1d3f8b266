//! Standalone pages keyed by file name.

use super::entry::{extract_body, extract_title};
use super::frontmatter::parse_document;
use super::markdown::render_markdown;
use crate::error::BlogResult;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// A non-dated page. Front-matter fields are carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub title: String,
    pub body: String,
    /// File stem, e.g. `about` for `pages/about.md`.
    pub url: String,
    #[serde(skip)]
    pub source: PathBuf,
}

impl Page {
    /// String value of a front-matter field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Build a page from a markdown source. No slug or date logic applies.
pub fn build_page(source: &str, path: &Path, excerpt_separator: &str) -> BlogResult<Page> {
    let doc = parse_document(source, path, excerpt_separator)?;

    let mut fields = doc.data;
    for computed in ["title", "body", "url"] {
        fields.remove(computed);
    }

    Ok(Page {
        fields,
        title: extract_title(&doc.content),
        body: render_markdown(extract_body(&doc.content)),
        url: page_url(path),
        source: path.to_path_buf(),
    })
}

/// Base name of the file without extension.
pub fn page_url(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_page() {
        let source = "---\nlayout: wide\nmenu: 2\n---\n# About Me\n\nHello.";
        let page = build_page(source, Path::new("pages/about.md"), "---").unwrap();

        assert_eq!(page.url, "about");
        assert_eq!(page.title, "About Me");
        assert!(page.body.contains("<h1>About Me</h1>"));
        assert_eq!(page.field("layout"), Some("wide"));
        assert_eq!(page.fields["menu"], 2);
    }

    #[test]
    fn test_page_url_is_not_slugged() {
        let page = build_page("# Hi", Path::new("pages/My Influences.md"), "---").unwrap();
        assert_eq!(page.url, "My Influences");
    }

    #[test]
    fn test_page_needs_no_date() {
        assert!(build_page("Plain text", Path::new("pages/videos.md"), "---").is_ok());
    }

    #[test]
    fn test_computed_fields_win() {
        let source = "---\ntitle: Metadata Title\nurl: elsewhere\n---\n# Heading Title";
        let page = build_page(source, Path::new("pages/x.md"), "---").unwrap();

        assert_eq!(page.title, "Heading Title");
        assert_eq!(page.url, "x");
        assert!(!page.fields.contains_key("title"));

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["title"], "Heading Title");
        assert_eq!(json["url"], "x");
    }
}
