//! `[build]` section configuration.
//!
//! Content directories, output locations and static-generation routes.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in blog.toml.
///
/// # Example
/// ```toml
/// [build]
/// entries = "entries"          # dated posts
/// pages = "pages"              # standalone pages
/// output = "dist"              # static generation target
/// routes = ["/", "/about", "/archive"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Dated entries, matched as `<entries>/**/*.md`.
    #[serde(default = "defaults::build::entries")]
    #[educe(Default = defaults::build::entries())]
    pub entries: PathBuf,

    /// Unpublished entries, matched as `<drafts>/*.md` when `--drafts` is set.
    #[serde(default = "defaults::build::drafts")]
    #[educe(Default = defaults::build::drafts())]
    pub drafts: PathBuf,

    /// Standalone pages, matched as `<pages>/**/*.md`.
    #[serde(default = "defaults::build::pages")]
    #[educe(Default = defaults::build::pages())]
    pub pages: PathBuf,

    /// Static files served as-is and copied into the output.
    #[serde(default = "defaults::build::public")]
    #[educe(Default = defaults::build::public())]
    pub public: PathBuf,

    /// Pre-rendered cover images land here.
    #[serde(default = "defaults::build::images")]
    #[educe(Default = defaults::build::images())]
    pub images: PathBuf,

    /// Static generation output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// SVG template for cover images.
    #[serde(default = "defaults::build::cover_template")]
    #[educe(Default = defaults::build::cover_template())]
    pub cover_template: PathBuf,

    /// Line separating an entry's excerpt from the rest of its content.
    #[serde(default = "defaults::build::excerpt_separator")]
    #[educe(Default = defaults::build::excerpt_separator())]
    pub excerpt_separator: String,

    /// Fixed routes rendered by static generation, besides one per entry.
    #[serde(default = "defaults::build::routes")]
    #[educe(Default = defaults::build::routes())]
    pub routes: Vec<String>,

    /// Remove the output directory before each build.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,
}
