//! Content discovery, indexing and file watching.
//!
//! The scanner turns the content directories into a stream of
//! [`ContentEvent`]s; the [`Indexer`] applies each event to the store.
//!
//! # Watched patterns
//!
//! | Class   | Pattern               | Active              |
//! |---------|-----------------------|---------------------|
//! | Draft   | `<drafts>/*.md`       | only with `--drafts`|
//! | Entry   | `<entries>/**/*.md`   | always              |
//! | Page    | `<pages>/**/*.md`     | always              |
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌───────────┐
//! │ notify   │───▶│ Debouncer│───▶│ ContentEvent │───▶│  Indexer  │───▶ BlogStore
//! │ events   │    │ (300ms)  │    │ Found/Changed│    │  apply()  │
//! └──────────┘    └──────────┘    └──────────────┘    └───────────┘
//!                                        ▲
//!                         scan() ────────┘ (startup, all Found)
//! ```

use crate::{
    config::SiteConfig,
    content::{build_entry, build_page, EntryOptions},
    data::{BlogStore, Upsert},
    error::{BlogError, BlogResult},
    log,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use walkdir::WalkDir;

const DEBOUNCE_MS: u64 = 300;

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Seen for the first time (startup scan or newly created).
    Found,
    /// Already indexed and modified since.
    Changed,
    /// No longer on disk.
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Draft,
    Entry,
    Page,
}

impl ContentClass {
    const ALL: [Self; 3] = [Self::Draft, Self::Entry, Self::Page];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Draft => "drafts",
            Self::Entry => "entries",
            Self::Page => "pages",
        }
    }

    fn dir(self, config: &SiteConfig) -> &Path {
        match self {
            Self::Draft => &config.build.drafts,
            Self::Entry => &config.build.entries,
            Self::Page => &config.build.pages,
        }
    }

    /// Drafts are matched one level deep only.
    const fn recursive(self) -> bool {
        !matches!(self, Self::Draft)
    }

    fn enabled(self, config: &SiteConfig) -> bool {
        !matches!(self, Self::Draft) || config.drafts
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEvent {
    pub kind: ChangeKind,
    pub class: ContentClass,
    pub path: PathBuf,
}

/// Which content class, if any, `path` belongs to.
pub fn classify(path: &Path, config: &SiteConfig) -> Option<ContentClass> {
    if path.extension().is_none_or(|ext| ext != "md") {
        return None;
    }

    ContentClass::ALL
        .into_iter()
        .filter(|class| class.enabled(config))
        .find(|class| match path.strip_prefix(class.dir(config)) {
            Ok(rel) => class.recursive() || rel.components().count() == 1,
            Err(_) => false,
        })
}

// =============================================================================
// Scanner
// =============================================================================

/// Walk the content directories, yielding a `Found` event per markdown file.
///
/// Events are ordered drafts, entries, pages and by path within each class.
pub fn scan(config: &SiteConfig) -> Vec<ContentEvent> {
    let mut events = Vec::new();

    for class in ContentClass::ALL.into_iter().filter(|c| c.enabled(config)) {
        let dir = class.dir(config);
        if !dir.is_dir() {
            continue;
        }

        let max_depth = if class.recursive() { usize::MAX } else { 1 };
        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|p| p.extension().is_some_and(|ext| ext == "md") && !is_temp_file(p))
            .collect();
        paths.sort();

        events.extend(paths.into_iter().map(|path| ContentEvent {
            kind: ChangeKind::Found,
            class,
            path,
        }));
    }

    events
}

// =============================================================================
// Indexer
// =============================================================================

/// Applies content events to a [`BlogStore`].
pub struct Indexer {
    store: Arc<BlogStore>,
    tag_domain: String,
    excerpt_separator: String,
}

impl Indexer {
    pub fn new(store: Arc<BlogStore>, config: &SiteConfig) -> Self {
        Self {
            store,
            tag_domain: config.base.tag_domain.clone(),
            excerpt_separator: config.build.excerpt_separator.clone(),
        }
    }

    pub fn store(&self) -> &Arc<BlogStore> {
        &self.store
    }

    /// Read, parse and upsert the file behind `event`.
    ///
    /// Returns `None` when nothing was upserted: the file was removed, or the
    /// entry is hidden (a previously indexed record is then dropped).
    pub fn apply(&self, event: &ContentEvent) -> BlogResult<Option<Upsert>> {
        let path = event.path.as_path();

        if event.kind == ChangeKind::Removed {
            self.store.remove_source(path);
            return Ok(None);
        }

        let source = fs::read_to_string(path).map_err(|source| BlogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match event.class {
            ContentClass::Entry | ContentClass::Draft => {
                let opts = EntryOptions {
                    tag_domain: &self.tag_domain,
                    excerpt_separator: &self.excerpt_separator,
                };
                match build_entry(&source, path, &opts)? {
                    Some(entry) => Ok(Some(self.store.upsert_entry(entry))),
                    None => {
                        self.store.remove_source(path);
                        Ok(None)
                    }
                }
            }
            ContentClass::Page => {
                let page = build_page(&source, path, &self.excerpt_separator)?;
                Ok(Some(self.store.upsert_page(page)))
            }
        }
    }

    /// Apply a batch of events, collecting per-file failures.
    pub fn apply_all(&self, events: &[ContentEvent]) -> Vec<BlogError> {
        events
            .iter()
            .filter_map(|event| self.apply(event).err())
            .collect()
    }

    /// Kind of change for a path reported by the watcher.
    fn change_kind(&self, path: &Path) -> ChangeKind {
        if !path.exists() {
            ChangeKind::Removed
        } else if self.store.contains_source(path) {
            ChangeKind::Changed
        } else {
            ChangeKind::Found
        }
    }
}

/// Initial scan. When this returns the index is ready to be served.
///
/// Files that fail to parse are returned rather than aborting the scan.
pub fn index_site(config: &SiteConfig, indexer: &Indexer) -> Vec<BlogError> {
    let events = scan(config);
    let errors = indexer.apply_all(&events);

    let store = indexer.store();
    log!("scan"; "indexed {} entries, {} pages", store.entry_count(), store.page_count());
    for err in &errors {
        log!("error"; "{err}");
    }

    errors
}

// =============================================================================
// Watcher
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Batches rapid file events with debouncing.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Turn a debounced batch of paths into content events.
fn to_events(paths: Vec<PathBuf>, config: &SiteConfig, indexer: &Indexer) -> Vec<ContentEvent> {
    paths
        .into_iter()
        .filter_map(|path| {
            let class = classify(&path, config)?;
            Some(ContentEvent {
                kind: indexer.change_kind(&path),
                class,
                path,
            })
        })
        .collect()
}

fn handle_changes(paths: Vec<PathBuf>, config: &SiteConfig, indexer: &Indexer) {
    let root = config.get_root();

    for event in to_events(paths, config, indexer) {
        let rel = event.path.strip_prefix(root).unwrap_or(&event.path).display().to_string();
        match indexer.apply(&event) {
            Ok(Some(Upsert::Inserted)) => log!("watch"; "added {rel}"),
            Ok(Some(Upsert::Updated)) => log!("watch"; "updated {rel}"),
            Ok(None) if event.kind == ChangeKind::Removed => log!("watch"; "removed {rel}"),
            Ok(None) => log!("watch"; "skipped hidden {rel}"),
            Err(e) => log!("error"; "{e}"),
        }
    }
}

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    for class in ContentClass::ALL.into_iter().filter(|c| c.enabled(config)) {
        let dir = class.dir(config);
        if !dir.exists() {
            continue;
        }

        let mode = if class.recursive() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(dir, mode)
            .with_context(|| format!("Failed to watch {}: {}", class.name(), dir.display()))?;
        log!("watch"; "{}/", dir.strip_prefix(config.get_root()).unwrap_or(dir).display());
    }
    Ok(())
}

/// Start blocking file watcher, re-indexing changed files.
pub fn watch_for_changes_blocking(config: &SiteConfig, indexer: &Indexer) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, config)?;

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(debouncer.take(), config, indexer);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site(drafts: bool) -> (TempDir, SiteConfig) {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["entries/2021", "drafts/nested", "pages"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        let mut config = SiteConfig::default();
        config.drafts = drafts;
        config.resolve_paths(dir.path());
        (dir, config)
    }

    fn write(config: &SiteConfig, rel: &str, content: &str) -> PathBuf {
        let path = config.get_root().join(rel);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_classify() {
        let (_dir, config) = site(true);
        let root = config.get_root();

        assert_eq!(classify(&root.join("entries/2021/a.md"), &config), Some(ContentClass::Entry));
        assert_eq!(classify(&root.join("drafts/a.md"), &config), Some(ContentClass::Draft));
        assert_eq!(classify(&root.join("drafts/nested/a.md"), &config), None);
        assert_eq!(classify(&root.join("pages/about.md"), &config), Some(ContentClass::Page));
        assert_eq!(classify(&root.join("pages/about.txt"), &config), None);
        assert_eq!(classify(&root.join("other/a.md"), &config), None);
    }

    #[test]
    fn test_classify_drafts_disabled() {
        let (_dir, config) = site(false);
        assert_eq!(classify(&config.get_root().join("drafts/a.md"), &config), None);
    }

    #[test]
    fn test_scan_finds_markdown() {
        let (_dir, config) = site(true);
        write(&config, "entries/2021/b.md", "");
        write(&config, "entries/a.md", "");
        write(&config, "entries/notes.txt", "");
        write(&config, "drafts/wip.md", "");
        write(&config, "drafts/nested/deep.md", "");
        write(&config, "pages/about.md", "");
        write(&config, "pages/.about.md.swp", "");

        let events = scan(&config);
        let names: Vec<_> = events
            .iter()
            .map(|e| e.path.strip_prefix(config.get_root()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            [
                PathBuf::from("drafts/wip.md"),
                PathBuf::from("entries/2021/b.md"),
                PathBuf::from("entries/a.md"),
                PathBuf::from("pages/about.md"),
            ]
        );
        assert!(events.iter().all(|e| e.kind == ChangeKind::Found));
        assert_eq!(events[0].class, ContentClass::Draft);
        assert_eq!(events[3].class, ContentClass::Page);
    }

    #[test]
    fn test_scan_skips_drafts_without_flag() {
        let (_dir, config) = site(false);
        write(&config, "drafts/wip.md", "");
        assert!(scan(&config).is_empty());
    }

    #[test]
    fn test_index_site() {
        let (_dir, config) = site(false);
        write(&config, "entries/hello.md", "---\ndate: June 3 2021\n---\n# Hello World\n");
        write(&config, "entries/secret.md", "---\ndate: 2021-06-04\nhidden: true\n---\n# Secret\n");
        write(&config, "entries/broken.md", "# No date\n");
        write(&config, "pages/about.md", "# About\n");

        let store = Arc::new(BlogStore::new());
        let indexer = Indexer::new(Arc::clone(&store), &config);
        let errors = index_site(&config, &indexer);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().ends_with("broken.md: not dated"));
        assert_eq!(store.entry_count(), 1);
        assert!(store.entry("2021/jun/03/hello-world").is_some());
        assert!(store.page("about").is_some());
    }

    #[test]
    fn test_hidden_document_never_indexed() {
        let (_dir, config) = site(false);
        let path = write(&config, "entries/hidden.md", "---\ndate: 2021-06-03\nhidden: true\n---\n# Hidden\n");

        let store = Arc::new(BlogStore::new());
        let indexer = Indexer::new(Arc::clone(&store), &config);
        let before = store.entry_count();
        let result = indexer.apply(&ContentEvent {
            kind: ChangeKind::Found,
            class: ContentClass::Entry,
            path: path.clone(),
        });

        assert_eq!(result.unwrap(), None);
        assert_eq!(store.entry_count(), before);
        assert!(!store.contains_source(&path));
    }

    #[test]
    fn test_changed_event_updates_in_place() {
        let (_dir, config) = site(false);
        let path = write(&config, "entries/post.md", "---\ndate: 2021-06-03\n---\n# Post\nv1\n");

        let store = Arc::new(BlogStore::new());
        let indexer = Indexer::new(Arc::clone(&store), &config);
        let found = ContentEvent {
            kind: ChangeKind::Found,
            class: ContentClass::Entry,
            path: path.clone(),
        };
        assert_eq!(indexer.apply(&found).unwrap(), Some(Upsert::Inserted));

        fs::write(&path, "---\ndate: 2021-06-03\n---\n# Post\nv2\n").unwrap();
        assert_eq!(indexer.change_kind(&path), ChangeKind::Changed);
        let changed = ContentEvent {
            kind: ChangeKind::Changed,
            ..found
        };
        assert_eq!(indexer.apply(&changed).unwrap(), Some(Upsert::Updated));

        assert_eq!(store.entry_count(), 1);
        let entry = store.entry("2021/jun/03/post").unwrap();
        assert!(entry.body.contains("v2"));
        assert_eq!(store.archive().bucket(2021, "06").len(), 1);
    }

    #[test]
    fn test_entry_becoming_hidden_is_dropped() {
        let (_dir, config) = site(false);
        let path = write(&config, "entries/post.md", "---\ndate: 2021-06-03\n---\n# Post\n");

        let store = Arc::new(BlogStore::new());
        let indexer = Indexer::new(Arc::clone(&store), &config);
        let event = ContentEvent {
            kind: ChangeKind::Found,
            class: ContentClass::Entry,
            path: path.clone(),
        };
        indexer.apply(&event).unwrap();

        fs::write(&path, "---\ndate: 2021-06-03\nhidden: true\n---\n# Post\n").unwrap();
        indexer.apply(&event).unwrap();
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn test_removed_file() {
        let (_dir, config) = site(false);
        let path = write(&config, "pages/about.md", "# About\n");

        let store = Arc::new(BlogStore::new());
        let indexer = Indexer::new(Arc::clone(&store), &config);
        index_site(&config, &indexer);
        assert_eq!(store.page_count(), 1);

        fs::remove_file(&path).unwrap();
        let events = to_events(vec![path], &config, &indexer);
        assert_eq!(events[0].kind, ChangeKind::Removed);
        indexer.apply_all(&events);
        assert_eq!(store.page_count(), 0);
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("entries/post.md~")));
        assert!(is_temp_file(Path::new("entries/.post.md.swp")));
        assert!(is_temp_file(Path::new("entries/post.bak")));
        assert!(!is_temp_file(Path::new("entries/post.md")));
    }
}
