//! Markdown → HTML.
//!
//! Besides plain CommonMark (plus tables, strikethrough and footnotes) two
//! authoring shortcuts are expanded before parsing:
//!
//! - Anonymous references. `[text][]` uses and `[]: url` definitions are
//!   numbered in order of appearance, so the n-th `[][]` pairs with the n-th
//!   `[]:`. Occurrences inside inline code are left alone.
//! - `⁂` becomes a standalone `<p class="asterism">` section break.

use pulldown_cmark::{Options, Parser, html::push_html};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static RE_CODE_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]+`").unwrap());
static RE_EMPTY_DEFINITION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\[\]:").unwrap());
static RE_EMPTY_REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\]\[\]").unwrap());

const ASTERISM: &str = "⁂";
const ASTERISM_HTML: &str = r#"<p class="asterism">⁂</p>"#;

/// Render markdown to HTML.
pub fn render_markdown(source: &str) -> String {
    let source = number_links(source).replace(ASTERISM, ASTERISM_HTML);

    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;
    let parser = Parser::new_ext(&source, options);

    let mut html = String::with_capacity(source.len() * 2);
    push_html(&mut html, parser);
    html
}

/// Number anonymous link definitions and references.
fn number_links(md: &str) -> String {
    let defined = replace_numbered(md, &RE_EMPTY_DEFINITION, |n| format!("\n[{n}]:"));
    replace_numbered(&defined, &RE_EMPTY_REFERENCE, |n| format!("][{n}]"))
}

/// Replace each match of `re` outside inline code with `make(n)`, n = 1, 2, ...
fn replace_numbered(text: &str, re: &Regex, make: impl Fn(usize) -> String) -> String {
    let code_spans: Vec<Range<usize>> = RE_CODE_SPAN.find_iter(text).map(|m| m.range()).collect();
    let in_code = |pos: usize| code_spans.iter().any(|r| r.contains(&pos));

    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    let mut index = 1;

    for m in re.find_iter(text) {
        if in_code(m.start()) {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        out.push_str(&make(index));
        last = m.end();
        index += 1;
    }
    out.push_str(&text[last..]);
    out
}
