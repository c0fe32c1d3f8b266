//! Development server with live reload support.
//!
//! This module provides a lightweight HTTP server built on `tiny_http`,
//! rendering views straight from the in-memory index:
//!
//! - Entry, page, home and archive views
//! - Cover images rendered on demand
//! - RSS feed
//! - Static files from `public/`
//! - File watching and re-indexing (via `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │     │  Reload Threads  │
//! │  (HTTP Server)  │     │  (File Monitor)  │     │   (WebSocket)    │
//! └────────┬────────┘     └────────┬─────────┘     └────────┬─────────┘
//!          │                       │                        │
//!          ▼                       ▼                        ▼
//!    Render views            Re-index files          Push store-update
//!          │                       │                        ▲
//!          └──────── read ──► Arc<BlogStore> ── StoreEvent ─┘
//! ```

use crate::{
    config::SiteConfig,
    cover::CoverRenderer,
    data::BlogStore,
    error::BlogError,
    feed::build_feed,
    log,
    reload::ReloadHub,
    render::{ViewContext, render_path},
    watch::{Indexer, watch_for_changes_blocking},
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Everything request handlers read from.
struct AppState {
    config: &'static SiteConfig,
    store: Arc<BlogStore>,
    covers: Arc<CoverRenderer>,
    /// Hot-reload client script, set when watching.
    script: Option<String>,
}

/// Start the development server with optional file watching.
///
/// This function:
/// 1. Binds to the configured interface and port (with auto-retry on port conflict)
/// 2. Sets up Ctrl+C handler for graceful shutdown
/// 3. Starts the reload hub and file watcher thread (if enabled)
/// 4. Enters the main request handling loop
///
/// The index must be populated before calling this. The server blocks until
/// Ctrl+C is received.
pub fn serve_site(
    config: &'static SiteConfig,
    indexer: Indexer,
    covers: Arc<CoverRenderer>,
) -> Result<()> {
    let interface: IpAddr = config.serve.interface.parse()?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    let store = Arc::clone(indexer.store());
    let mut script = None;

    if config.serve.watch {
        match ReloadHub::bind(interface, config.serve.reload_port) {
            Ok(hub) => {
                log!("reload"; "ws://{}", hub.addr());
                hub.forward(store.subscribe());
                script = Some(hub.client_script());
            }
            Err(err) => log!("reload"; "disabled: {err:#}"),
        }

        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(config, &indexer) {
                log!("watch"; "{err}");
            }
        });
    }

    let state = AppState {
        config,
        store,
        covers,
        script,
    };

    // Handle requests in main thread (blocks until Ctrl+C)
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &state) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// What a request path asks for.
#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Favicon,
    /// Entry URL without the `/cover/` prefix and `.png` suffix.
    Cover(&'a str),
    Feed,
    /// Static file or view, leading and trailing slashes removed.
    Other(&'a str),
}

fn route(path: &str) -> Route<'_> {
    if path == "/favicon.ico" {
        return Route::Favicon;
    }
    if path == "/feed.xml" {
        return Route::Feed;
    }
    if let Some(url) = path
        .strip_prefix("/cover/")
        .and_then(|rest| rest.strip_suffix(".png"))
    {
        return Route::Cover(url);
    }
    Route::Other(path.trim_matches('/'))
}

/// Handle a single HTTP request.
///
/// Request resolution order:
/// 1. `/favicon.ico` → 204
/// 2. `/cover/<entry-url>.png` → rendered cover
/// 3. `/feed.xml` → RSS feed
/// 4. File under `public/` → serve file
/// 5. View (home, archive, entry, page) → HTML
/// 6. Nothing found → 404
fn handle_request(request: Request, state: &AppState) -> Result<()> {
    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    // Strip query string (e.g., ?t=123456) before resolving path
    let path = url_path.split('?').next().unwrap_or(&url_path).to_owned();

    match route(&path) {
        Route::Favicon => {
            request.respond(Response::empty(StatusCode(204)))?;
            Ok(())
        }
        Route::Cover(url) => serve_cover(request, url, state),
        Route::Feed => match build_feed(&state.store, state.config) {
            Ok(xml) => serve_bytes(request, xml.into_bytes(), "application/rss+xml; charset=utf-8"),
            Err(e) => serve_error(request, 500, &format!("{e:#}")),
        },
        Route::Other(rel) => {
            if let Some(file) = resolve_static(&state.config.build.public, rel) {
                return serve_file(request, &file);
            }

            let mut ctx = ViewContext::new(&state.store, state.config);
            if let Some(script) = &state.script {
                ctx = ctx.with_script(script);
            }

            match render_path(&path, &ctx) {
                Ok(html) => serve_bytes(request, html.into_bytes(), "text/html; charset=utf-8"),
                Err(BlogError::NotFound(_)) => serve_not_found(request),
                Err(e) => serve_error(request, e.status(), &e.to_string()),
            }
        }
    }
}

fn serve_cover(request: Request, url: &str, state: &AppState) -> Result<()> {
    let Some(entry) = state.store.entry(url) else {
        return serve_not_found(request);
    };

    match state.covers.render(&entry) {
        Ok(png) => serve_bytes(request, png, "image/png"),
        Err(e) => {
            log!("cover"; "/{url}: {e}");
            serve_error(request, e.status(), &e.to_string())
        }
    }
}

/// File under `public` for a request path, if one exists.
///
/// Paths that try to leave `public` are never resolved.
fn resolve_static(public: &Path, rel: &str) -> Option<PathBuf> {
    if rel.is_empty() {
        return None;
    }
    let rel = Path::new(rel);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    let path = public.join(rel);
    path.is_file().then_some(path)
}

// ============================================================================
// Response Helpers
// ============================================================================

fn content_type(value: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", value).map_err(|()| anyhow!("invalid header: {value}"))
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serve_bytes(request, content, guess_content_type(path))
}

fn serve_bytes(request: Request, content: Vec<u8>, mime: &str) -> Result<()> {
    let response = Response::from_data(content).with_header(content_type(mime)?);
    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    serve_error(request, 404, "404 Not Found")
}

fn serve_error(request: Request, status: u16, message: &str) -> Result<()> {
    let response = Response::from_string(message)
        .with_status_code(StatusCode(status))
        .with_header(content_type("text/plain; charset=utf-8")?);
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}
