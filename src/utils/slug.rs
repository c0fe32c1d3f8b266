//! URL slugification.
//!
//! Titles and file names become lowercase, hyphen-separated ASCII.
//! Non-ASCII text is transliterated with `deunicode` first, so
//! "Café Olé" and "Cafe Ole" share a slug.

use deunicode::deunicode;

/// Symbols spelled out before transliteration.
const REPLACEMENTS: [(&str, &str); 3] = [("&", " and "), ("♥", " love "), ("🦄", " unicorn ")];

/// Convert text to a URL-safe slug.
///
/// - `&`, `♥` and `🦄` read as words
/// - an apostrophe inside a word is dropped ("What's" → "whats")
/// - camelCase boundaries become separators ("fooBar" → "foo-bar")
/// - runs of non-alphanumeric characters collapse to a single `-`
/// - leading and trailing separators are dropped
pub fn slugify(text: &str) -> String {
    let mut text = text.to_owned();
    for (symbol, word) in REPLACEMENTS {
        if text.contains(symbol) {
            text = text.replace(symbol, word);
        }
    }
    // `’` transliterates to `'`
    let ascii = deunicode(&text);

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_sep = false;
    let mut prev: Option<char> = None;
    let mut chars = ascii.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_alphanumeric() {
            let camel_break = c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            if (pending_sep || camel_break) && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_sep = false;
        } else if c == '\''
            && prev.is_some_and(|p| p.is_ascii_alphanumeric())
            && chars.peek().is_some_and(char::is_ascii_alphanumeric)
        {
            continue;
        } else {
            pending_sep = true;
        }
        prev = Some(c);
    }

    slug
}
