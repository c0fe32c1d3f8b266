//! Cover images for entries.
//!
//! An SVG template is filled with entry fields and rasterized to PNG:
//!
//! ```text
//! article.svg ──${field}──► SVG text ──usvg──► Tree ──resvg──► Pixmap ──► PNG
//! ```
//!
//! The font database is loaded once when the renderer is created and shared
//! by every render. Renders are serialized through a mutex.

use crate::{
    content::Entry,
    error::{BlogError, BlogResult},
    log,
    utils::escape::escape_xml,
};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use regex::{Captures, Regex};
use resvg::tiny_skia::{Pixmap, Transform};
use std::{fs, path::Path, sync::LazyLock};

/// Template used when no `article.svg` exists in the site.
const DEFAULT_TEMPLATE: &str = include_str!("embed/article.svg");

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\s*(\w+)\s*\}").unwrap());

/// Rasterizes cover templates. Acquire once, share behind an `Arc`.
pub struct CoverRenderer {
    template: String,
    options: Mutex<usvg::Options<'static>>,
}

impl CoverRenderer {
    /// Load the template at `path`, falling back to the embedded default.
    pub fn load(path: &Path) -> Result<Self> {
        let template = if path.is_file() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read cover template {}", path.display()))?
        } else {
            log!("cover"; "{} not found, using built-in template", path.display());
            DEFAULT_TEMPLATE.to_owned()
        };
        Ok(Self::new(template))
    }

    pub fn new(template: String) -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();

        Self {
            template,
            options: Mutex::new(options),
        }
    }

    /// SVG source of the cover for `entry`.
    pub fn svg(&self, entry: &Entry) -> String {
        fill_template(&self.template, entry)
    }

    /// PNG bytes of the cover for `entry`.
    pub fn render(&self, entry: &Entry) -> BlogResult<Vec<u8>> {
        self.rasterize(&self.svg(entry))
    }

    /// Rasterize arbitrary SVG text to PNG.
    pub fn rasterize(&self, svg: &str) -> BlogResult<Vec<u8>> {
        let options = self.options.lock();

        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| BlogError::Render(format!("invalid cover svg: {e}")))?;

        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            BlogError::Render(format!("bad cover size {}x{}", size.width(), size.height()))
        })?;

        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| BlogError::Render(format!("png encoding failed: {e}")))
    }
}

/// Substitute `${field}` placeholders with XML-escaped entry values.
///
/// Unknown fields become empty strings.
pub fn fill_template(template: &str, entry: &Entry) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let value = match &caps[1] {
                "title" => entry.title.clone(),
                "url" => entry.url.clone(),
                "published" => entry.published.clone(),
                "excerpt" => entry.excerpt.clone(),
                "id" => entry.id.clone(),
                "date" => entry.date.format("%Y-%m-%d").to_string(),
                "year" => entry.date.format("%Y").to_string(),
                _ => String::new(),
            };
            escape_xml(&value)
        })
        .into_owned()
}

/// File name of the generated cover, e.g. `2021-jun-03-hello-world.png`.
pub fn cover_file_name(url: &str) -> String {
    format!("{}.png", url.trim_matches('/').replace('/', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::archive::tests::entry;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_fill_template() {
        let mut e = entry("2021/jun/03/hello-world", "2021-06-03", false);
        e.title = "Hello & <World>".into();
        e.published = "June 3 2021".into();

        let svg = fill_template("<text>${title}|${url}|${published}|${year}|${date}</text>", &e);
        assert_eq!(
            svg,
            "<text>Hello &amp; &lt;World&gt;|2021/jun/03/hello-world|June 3 2021|2021|2021-06-03</text>"
        );
    }

    #[test]
    fn test_fill_template_unknown_placeholder() {
        let e = entry("post", "2021-06-03", false);
        assert_eq!(fill_template("a${nope}b${ title }", &e), "abpost");
    }

    #[test]
    fn test_cover_file_name() {
        assert_eq!(cover_file_name("2021/jun/03/hello-world"), "2021-jun-03-hello-world.png");
        assert_eq!(cover_file_name("/about/"), "about.png");
    }

    #[test]
    fn test_rasterize_png() {
        let renderer = CoverRenderer::new(String::new());
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"><rect width="40" height="20" fill="#f00"/></svg>"##;
        let png = renderer.rasterize(svg).unwrap();
        assert!(png.starts_with(PNG_MAGIC));
    }

    #[test]
    fn test_render_default_template() {
        let renderer = CoverRenderer::new(DEFAULT_TEMPLATE.to_owned());
        let png = renderer.render(&entry("post", "2021-06-03", false)).unwrap();
        assert!(png.starts_with(PNG_MAGIC));
    }

    #[test]
    fn test_invalid_svg_is_render_error() {
        let renderer = CoverRenderer::new(String::new());
        let err = renderer.rasterize("not svg").unwrap_err();
        assert!(matches!(err, BlogError::Render(_)));
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_load_missing_template_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = CoverRenderer::load(&dir.path().join("article.svg")).unwrap();
        assert!(renderer.svg(&entry("post", "2021-06-03", false)).contains("/post"));
    }
}
