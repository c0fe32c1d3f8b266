//! Static site generation.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── prepare_output()   clear output when `clean`
//!     ├── write_covers()     public/images/<url>.png, missing ones only
//!     ├── copy_public()      public/ ──► output/
//!     ├── write_pages()      paths() ──► output/<path>/index.html
//!     └── write_feed()       output/feed.xml
//! ```

use crate::{
    config::SiteConfig,
    cover::{CoverRenderer, cover_file_name},
    data::BlogStore,
    error::BlogError,
    feed::write_feed,
    log,
    render::{ViewContext, render_path},
};
use anyhow::{Context, Result};
use std::{fs, path::Path};
use walkdir::WalkDir;

/// Generate the whole site into `[build].output`.
pub fn build_site(config: &SiteConfig, store: &BlogStore, renderer: &CoverRenderer) -> Result<()> {
    let output = &config.build.output;
    prepare_output(output, config.build.clean)?;

    let covers = write_covers(store, renderer, &config.build.images)?;
    log!("cover"; "{covers} new cover(s)");

    let copied = copy_public(&config.build.public, output)?;
    log!("build"; "copied {copied} static file(s)");

    let pages = write_pages(store, config, output)?;
    log!("build"; "wrote {pages} page(s)");

    write_feed(store, config, output)?;

    log!("build"; "done: {}", output.display());
    Ok(())
}

fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output).with_context(|| {
            format!("Failed to clear output directory: {}", output.display())
        })?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

/// Every path to pre-render: the fixed routes, then one per entry.
pub fn paths(store: &BlogStore, config: &SiteConfig) -> Vec<String> {
    let mut paths = config.build.routes.clone();
    for url in store.entry_urls() {
        let path = format!("/{url}");
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

/// Render every path in [`paths`] to `<output>/<path>/index.html`.
///
/// Paths with no view (e.g. a route whose page does not exist) are skipped.
/// Returns the number of files written.
pub fn write_pages(store: &BlogStore, config: &SiteConfig, output: &Path) -> Result<usize> {
    let ctx = ViewContext::new(store, config);
    let mut written = 0;

    for path in paths(store, config) {
        let html = match render_path(&path, &ctx) {
            Ok(html) => html,
            Err(BlogError::NotFound(_)) => {
                log!("build"; "skipping {path}: nothing to render");
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to render {path}")),
        };

        let dir = output.join(path.trim_matches('/'));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        fs::write(dir.join("index.html"), html)
            .with_context(|| format!("Failed to write {path}"))?;
        written += 1;
    }

    Ok(written)
}

/// Write a cover for every entry that does not have one in `images_dir`.
///
/// Returns the number of covers written; a second run over the same index
/// writes none.
pub fn write_covers(store: &BlogStore, renderer: &CoverRenderer, images_dir: &Path) -> Result<usize> {
    fs::create_dir_all(images_dir)
        .with_context(|| format!("Failed to create {}", images_dir.display()))?;

    let mut written = 0;
    for entry in store.entries() {
        let name = cover_file_name(&entry.url);
        let path = images_dir.join(&name);
        if path.exists() {
            continue;
        }

        let png = renderer
            .render(&entry)
            .with_context(|| format!("Failed to render cover for /{}", entry.url))?;
        fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        log!("cover"; "generated /images/{name}");
        written += 1;
    }

    Ok(written)
}

/// Copy `public/` into `output`, returning the number of files copied.
fn copy_public(public: &Path, output: &Path) -> Result<usize> {
    if !public.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(public).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(public)?;
        let dest = output.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)
            .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        copied += 1;
    }

    Ok(copied)
}
