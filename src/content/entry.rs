//! Entry construction: title, body, URL and feed identifier.

use super::frontmatter::parse_entry;
use super::markdown::render_markdown;
use crate::error::BlogResult;
use crate::utils::date::month_abbr;
use crate::utils::slug::slugify;
use chrono::{Datelike, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static RE_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s+(.*)").unwrap());

/// A dated blog post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// `YYYY/mon/DD/slug`, no leading slash. Unique key in the index.
    pub url: String,
    pub title: String,
    pub featured: bool,
    pub date: NaiveDateTime,
    /// The front-matter date as written.
    pub published: String,
    pub excerpt: String,
    /// `tag:` URI for syndication feeds.
    pub id: String,
    /// Rendered HTML, starting at the title heading.
    pub body: String,
    #[serde(skip)]
    pub source: PathBuf,
}

/// Settings the entry builder needs from the site config.
#[derive(Debug, Clone)]
pub struct EntryOptions<'a> {
    pub tag_domain: &'a str,
    pub excerpt_separator: &'a str,
}

/// Build an entry from a markdown source.
///
/// Returns `Ok(None)` for hidden documents, which never enter the index.
pub fn build_entry(source: &str, path: &Path, opts: &EntryOptions) -> BlogResult<Option<Entry>> {
    let parsed = parse_entry(source, path, opts.excerpt_separator, false)?;
    if parsed.hidden {
        return Ok(None);
    }
    // `parse_entry` only leaves the date empty for optional or hidden documents
    let Some(date) = parsed.date else {
        return Ok(None);
    };

    let content = &parsed.doc.content;
    let title = extract_title(content);
    let url = entry_url(path, &title, &date);

    Ok(Some(Entry {
        id: feed_id(opts.tag_domain, &date, &url),
        body: render_markdown(extract_body(content)),
        url,
        title,
        featured: parsed.featured,
        date,
        published: parsed.published,
        excerpt: parsed.doc.excerpt,
        source: path.to_path_buf(),
    }))
}

/// First `# heading` text, searching from the first `#` in the content.
pub fn extract_title(content: &str) -> String {
    content
        .find('#')
        .and_then(|start| RE_HEADING.captures(&content[start..]))
        .map(|caps| caps[1].trim_end().to_owned())
        .unwrap_or_default()
}

/// Content from the first `#` onward, trimmed. Whole content if there is none.
pub fn extract_body(content: &str) -> &str {
    let start = content.find('#').unwrap_or(0);
    content[start..].trim()
}

/// `YYYY/mon/DD/slug`, slugging the file stem when the title is empty.
pub fn entry_url(path: &Path, title: &str, date: &NaiveDateTime) -> String {
    let slug = if title.is_empty() {
        let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        slugify(&stem)
    } else {
        slugify(title)
    };

    format!(
        "{}/{}/{:02}/{}",
        date.year(),
        month_abbr(date),
        date.day(),
        slug
    )
}

/// `tag:<domain>,<year>:<url>`
pub fn feed_id(domain: &str, date: &NaiveDateTime, url: &str) -> String {
    format!("tag:{domain},{}:{url}", date.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::parse_date;

    const OPTS: EntryOptions<'static> = EntryOptions {
        tag_domain: "hire.jonasgalvez.com.br",
        excerpt_separator: "---",
    };

    fn build(source: &str) -> Option<Entry> {
        build_entry(source, Path::new("entries/some-file.md"), &OPTS).unwrap()
    }

    #[test]
    fn test_build_entry_example() {
        let entry = build("---\ndate: June 3 2021\n---\n# Hello World\n\nFirst post.\n").unwrap();

        assert_eq!(entry.url, "2021/jun/03/hello-world");
        assert_eq!(
            entry.id,
            "tag:hire.jonasgalvez.com.br,2021:2021/jun/03/hello-world"
        );
        assert_eq!(entry.title, "Hello World");
        assert_eq!(entry.published, "June 3 2021");
        assert_eq!(entry.date, parse_date("2021-06-03").unwrap());
        assert!(entry.body.starts_with("<h1>Hello World</h1>"));
        assert!(entry.body.contains("<p>First post.</p>"));
        assert!(!entry.featured);
    }

    #[test]
    fn test_build_entry_excerpt_and_body() {
        let source = "---\ndate: 2021-06-10\nfeatured: true\n---\nTeaser text.\n---\n# Second\nBody";
        let entry = build(source).unwrap();

        assert_eq!(entry.excerpt, "Teaser text.");
        assert!(entry.featured);
        assert!(!entry.body.contains("Teaser"));
        assert_eq!(entry.url, "2021/jun/10/second");
    }

    #[test]
    fn test_build_entry_hidden() {
        assert!(build("---\ndate: 2021-06-03\nhidden: true\n---\n# Secret").is_none());
    }

    #[test]
    fn test_build_entry_undated_errors() {
        let result = build_entry("# Title", Path::new("entries/x.md"), &OPTS);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_entry_without_title_uses_file_stem() {
        let entry = build("---\ndate: 2020-01-05\n---\nJust text.").unwrap();
        assert_eq!(entry.title, "");
        assert_eq!(entry.url, "2020/jan/05/some-file");
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("intro\n# The Title\nbody"), "The Title");
        assert_eq!(extract_title("no heading here"), "");
        // A `#` that does not open a heading yields nothing
        assert_eq!(extract_title("issue #42\n# Later"), "");
        assert_eq!(extract_title("##Tight"), "");
    }

    #[test]
    fn test_extract_body() {
        assert_eq!(extract_body("teaser\n---\n# Title\nbody\n\n"), "# Title\nbody");
        assert_eq!(extract_body("  plain text  "), "plain text");
    }

    #[test]
    fn test_entry_url_shape() {
        let date = parse_date("2019-11-28").unwrap();
        let url = entry_url(Path::new("x.md"), "Café & Crème", &date);
        assert_eq!(url, "2019/nov/28/cafe-and-creme");
    }
}
