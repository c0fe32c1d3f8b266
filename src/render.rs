//! Server-side HTML views.
//!
//! Templates are embedded at compile time and filled with `{placeholder}`
//! substitution. Each template is filled in one pass over the template text,
//! so placeholder-like text inside a value (a title, a body) is left as is.
//!
//! | Path             | View                                     |
//! |------------------|------------------------------------------|
//! | `/`              | featured entries, then recent entries    |
//! | `/archive`       | year / month buckets                     |
//! | `/<entry-url>`   | a single entry                           |
//! | `/<page-url>`    | a page (`/about`, `/videos`, ...)        |

use crate::{
    config::SiteConfig,
    content::{Entry, Page},
    cover::cover_file_name,
    data::BlogStore,
    error::{BlogError, BlogResult},
    utils::escape::html_escape,
};
use regex::{Captures, Regex};
use std::{
    fmt::Write,
    sync::{Arc, LazyLock},
};

const LAYOUT_TEMPLATE: &str = include_str!("embed/layout.html");
const HOME_TEMPLATE: &str = include_str!("embed/home.html");
const ARCHIVE_TEMPLATE: &str = include_str!("embed/archive.html");
const ENTRY_TEMPLATE: &str = include_str!("embed/entry.html");
const PAGE_TEMPLATE: &str = include_str!("embed/page.html");

/// Number of entries listed under "Recent" on the home page.
const RECENT_LIMIT: usize = 10;

/// `{name}` in an HTML template.
static TEMPLATE_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Everything a view needs to render.
pub struct ViewContext<'a> {
    pub store: &'a BlogStore,
    pub config: &'a SiteConfig,
    /// Hot-reload client script, appended to every page when set.
    pub script: Option<&'a str>,
}

impl<'a> ViewContext<'a> {
    pub fn new(store: &'a BlogStore, config: &'a SiteConfig) -> Self {
        Self {
            store,
            config,
            script: None,
        }
    }

    pub fn with_script(mut self, script: &'a str) -> Self {
        self.script = Some(script);
        self
    }
}

/// Render the view for a request path.
pub fn render_path(path: &str, ctx: &ViewContext) -> BlogResult<String> {
    let key = path.split(['?', '#']).next().unwrap_or_default().trim_matches('/');

    match key {
        "" => Ok(render_home(ctx)),
        "archive" => Ok(render_archive(ctx)),
        _ => {
            if let Some(entry) = ctx.store.entry(key) {
                Ok(render_entry(&entry, ctx))
            } else if let Some(page) = ctx.store.page(key) {
                Ok(render_page(&page, ctx))
            } else {
                Err(BlogError::NotFound(key.to_owned()))
            }
        }
    }
}

// ============================================================================
// Views
// ============================================================================

fn render_home(ctx: &ViewContext) -> String {
    let featured = list_items(&ctx.store.featured());
    let entries = ctx.store.entries();
    let recent = list_items(&entries[..entries.len().min(RECENT_LIMIT)]);

    let content = fill(
        HOME_TEMPLATE,
        &[("featured", featured.as_str()), ("recent", recent.as_str())],
    );
    layout(ctx, &ctx.config.base.title, None, "", &content)
}

fn render_archive(ctx: &ViewContext) -> String {
    let archive = ctx.store.archive();
    let mut years = String::new();

    if archive.is_empty() {
        years.push_str("  <p>No entries yet.</p>\n");
    }
    for year in archive.years() {
        let _ = writeln!(years, "  <h2>{year}</h2>");
        for month in archive.months(year) {
            let bucket = archive.bucket(year, month);
            let Some(first) = bucket.first() else {
                continue;
            };
            let _ = writeln!(years, "  <h3>{}</h3>", first.date.format("%B"));
            let _ = writeln!(years, "  <ul>\n{}  </ul>", list_items(bucket));
        }
    }

    let count = archive.len().to_string();
    let content = fill(
        ARCHIVE_TEMPLATE,
        &[("count", count.as_str()), ("years", years.as_str())],
    );
    let title = format!("Archive - {}", ctx.config.base.title);
    layout(ctx, &title, None, "", &content)
}

fn render_entry(entry: &Entry, ctx: &ViewContext) -> String {
    let site_url = ctx.config.site_url();
    let mut head = String::new();
    let _ = write!(
        head,
        r#"<meta name="twitter:card" content="summary_large_image">
  <meta property="og:title" content="{title}">
  <meta property="og:description" content="{excerpt}">
  <meta property="og:image" content="{site_url}/images/{image}">"#,
        title = html_escape(&entry.title),
        excerpt = html_escape(&entry.excerpt),
        image = cover_file_name(&entry.url),
    );

    let date = entry.date.format("%Y-%m-%d").to_string();
    let published = html_escape(&entry.published);
    let content = fill(
        ENTRY_TEMPLATE,
        &[
            ("date", date.as_str()),
            ("published", &*published),
            ("body", entry.body.as_str()),
        ],
    );

    let title = format!("{} - {}", entry.title, ctx.config.base.title);
    layout(ctx, &title, None, &head, &content)
}

fn render_page(page: &Page, ctx: &ViewContext) -> String {
    let url = html_escape(&page.url);
    let content = fill(PAGE_TEMPLATE, &[("url", &*url), ("body", page.body.as_str())]);

    let title = if page.title.is_empty() {
        ctx.config.base.title.clone()
    } else {
        format!("{} - {}", page.title, ctx.config.base.title)
    };
    layout(ctx, &title, page.field("description"), "", &content)
}

// ============================================================================
// Helpers
// ============================================================================

/// Substitute `{name}` placeholders in a single pass.
///
/// Values are inserted verbatim and never re-scanned. Unknown names are kept.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    TEMPLATE_VAR
        .replace_all(template, |caps: &Captures| {
            vars.iter()
                .find(|(name, _)| *name == &caps[1])
                .map_or_else(|| caps[0].to_owned(), |(_, value)| (*value).to_owned())
        })
        .into_owned()
}

fn list_items(entries: &[Arc<Entry>]) -> String {
    let mut html = String::new();
    for entry in entries {
        let _ = writeln!(
            html,
            r#"    <li><a href="/{url}">{title}</a> <time datetime="{date}">{published}</time></li>"#,
            url = entry.url,
            title = html_escape(&entry.title),
            date = entry.date.format("%Y-%m-%d"),
            published = html_escape(&entry.published),
        );
    }
    html
}

/// Archive link followed by one link per page.
fn nav_links(ctx: &ViewContext) -> String {
    let mut nav = String::from(r#"<a href="/archive">Archive</a>"#);
    for page in ctx.store.pages() {
        let label = if page.title.is_empty() { &page.url } else { &page.title };
        let _ = write!(
            nav,
            "\n      <a href=\"/{}\">{}</a>",
            urlencoding::encode(&page.url),
            html_escape(label)
        );
    }
    nav
}

fn layout(
    ctx: &ViewContext,
    title: &str,
    description: Option<&str>,
    head: &str,
    content: &str,
) -> String {
    let base = &ctx.config.base;
    let language = html_escape(&base.language);
    let author = html_escape(&base.author);
    let description = html_escape(description.unwrap_or(&base.description));
    let site_url = ctx.config.site_url();
    let site_title = html_escape(&base.title);
    let title = html_escape(title);
    let nav = nav_links(ctx);

    fill(
        LAYOUT_TEMPLATE,
        &[
            ("language", &*language),
            ("author", &*author),
            ("description", &*description),
            ("site_url", site_url.as_str()),
            ("site_title", &*site_title),
            ("title", &*title),
            ("nav", nav.as_str()),
            ("script", ctx.script.unwrap_or_default()),
            ("head", head),
            ("content", content),
        ],
    )
}
