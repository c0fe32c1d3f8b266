//! The in-memory blog index.
//!
//! Shared as `Arc<BlogStore>` between the HTTP server, the static generator
//! and the watcher thread.
//!
//! # Thread Safety
//!
//! Uses `RwLock` to allow:
//! - Multiple concurrent reads (request handlers, generation)
//! - Exclusive writes (the indexer, one file event at a time)
//!
//! # Updates
//!
//! Records are immutable `Arc`s. An update replaces the record under its key
//! and broadcasts a [`StoreEvent`]; holders re-fetch by key instead of
//! observing mutation.

use super::archive::Archive;
use crate::content::{Entry, Page};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{Receiver, Sender, channel},
    },
};

/// Emitted after every change to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Entry { url: String },
    Page { url: String },
    Removed { url: String },
}

/// Whether an upsert created a record or replaced one from the same source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

#[derive(Debug, Default)]
struct Index {
    entries: FxHashMap<String, Arc<Entry>>,
    pages: FxHashMap<String, Arc<Page>>,
    archive: Archive,
    /// Source file → entry URL
    entry_paths: FxHashMap<PathBuf, String>,
    /// Source file → page URL
    page_paths: FxHashMap<PathBuf, String>,
}

#[derive(Debug, Default)]
pub struct BlogStore {
    index: RwLock<Index>,
    subscribers: Mutex<Vec<Sender<StoreEvent>>>,
}

impl BlogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, or replace the one previously built from the same file.
    ///
    /// The old record leaves its archive bucket before the new one is filed,
    /// so a changed date moves the entry instead of duplicating it.
    pub fn upsert_entry(&self, entry: Entry) -> Upsert {
        let entry = Arc::new(entry);
        let url = entry.url.clone();

        let outcome = {
            let mut index = self.index.write();
            let outcome = match index.entry_paths.insert(entry.source.clone(), url.clone()) {
                Some(old_url) => {
                    index.entries.remove(&old_url);
                    index.archive.remove(&old_url);
                    Upsert::Updated
                }
                None => Upsert::Inserted,
            };

            // Another file already claimed this URL: the newer file wins
            if let Some(previous) = index.entries.insert(url.clone(), Arc::clone(&entry)) {
                index.archive.remove(&previous.url);
                index.entry_paths.remove(&previous.source);
            }

            index.archive.insert(entry);
            outcome
        };

        self.emit(StoreEvent::Entry { url });
        outcome
    }

    /// Insert a page, or replace the one previously built from the same file.
    pub fn upsert_page(&self, page: Page) -> Upsert {
        let page = Arc::new(page);
        let url = page.url.clone();

        let outcome = {
            let mut index = self.index.write();
            let outcome = match index.page_paths.insert(page.source.clone(), url.clone()) {
                Some(old_url) => {
                    index.pages.remove(&old_url);
                    Upsert::Updated
                }
                None => Upsert::Inserted,
            };
            if let Some(previous) = index.pages.insert(url.clone(), page) {
                index.page_paths.remove(&previous.source);
            }
            outcome
        };

        self.emit(StoreEvent::Page { url });
        outcome
    }

    /// Forget whatever record was built from `source`.
    ///
    /// Used when a file disappears or an entry becomes hidden.
    pub fn remove_source(&self, source: &Path) -> Option<String> {
        let url = {
            let mut index = self.index.write();
            if let Some(url) = index.entry_paths.remove(source) {
                index.entries.remove(&url);
                index.archive.remove(&url);
                Some(url)
            } else if let Some(url) = index.page_paths.remove(source) {
                index.pages.remove(&url);
                Some(url)
            } else {
                None
            }
        }?;

        self.emit(StoreEvent::Removed { url: url.clone() });
        Some(url)
    }

    /// Receive every future [`StoreEvent`].
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = channel();
        self.subscribers.lock().push(tx);
        rx
    }

    fn emit(&self, event: StoreEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ------------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------------

    pub fn entry(&self, url: &str) -> Option<Arc<Entry>> {
        self.index.read().entries.get(url.trim_matches('/')).cloned()
    }

    pub fn page(&self, url: &str) -> Option<Arc<Page>> {
        self.index.read().pages.get(url.trim_matches('/')).cloned()
    }

    /// Whether `source` currently backs a record.
    pub fn contains_source(&self, source: &Path) -> bool {
        let index = self.index.read();
        index.entry_paths.contains_key(source) || index.page_paths.contains_key(source)
    }

    /// All entries, newest first.
    pub fn entries(&self) -> Vec<Arc<Entry>> {
        let mut entries: Vec<_> = self.index.read().entries.values().cloned().collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.url.cmp(&b.url)));
        entries
    }

    /// URLs of all entries, newest first.
    pub fn entry_urls(&self) -> Vec<String> {
        self.entries().iter().map(|e| e.url.clone()).collect()
    }

    /// All pages, by URL.
    pub fn pages(&self) -> Vec<Arc<Page>> {
        let mut pages: Vec<_> = self.index.read().pages.values().cloned().collect();
        pages.sort_by(|a, b| a.url.cmp(&b.url));
        pages
    }

    /// Featured entries, newest first.
    pub fn featured(&self) -> Vec<Arc<Entry>> {
        self.index.read().archive.featured().to_vec()
    }

    /// Snapshot of the archive.
    pub fn archive(&self) -> Archive {
        self.index.read().archive.clone()
    }

    pub fn entry_count(&self) -> usize {
        self.index.read().entries.len()
    }

    pub fn page_count(&self) -> usize {
        self.index.read().pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::archive::tests::entry;
    use serde_json::Map;

    fn page(url: &str, source: &str) -> Page {
        Page {
            fields: Map::new(),
            title: url.to_owned(),
            body: String::new(),
            url: url.to_owned(),
            source: PathBuf::from(source),
        }
    }

    #[test]
    fn test_insert_entries() {
        let store = BlogStore::new();
        assert_eq!(store.upsert_entry(entry("a", "2021-06-03", false)), Upsert::Inserted);
        assert_eq!(store.upsert_entry(entry("b", "2021-06-10", true)), Upsert::Inserted);

        assert_eq!(store.entry_count(), 2);
        let urls: Vec<_> = store.entries().iter().map(|e| e.url.clone()).collect();
        assert_eq!(urls, ["b", "a"]);
        assert_eq!(store.featured().len(), 1);
        assert!(store.entry("/a/").is_some());
    }

    #[test]
    fn test_entry_urls_newest_first() {
        let store = BlogStore::new();
        assert!(store.entry_urls().is_empty());

        store.upsert_entry(entry("middle", "2021-03-01", false));
        store.upsert_entry(entry("newest", "2021-06-03", false));
        store.upsert_entry(entry("oldest", "2019-12-25", true));
        store.remove_source(Path::new("entries/middle.md"));

        assert_eq!(store.entry_urls(), ["newest", "oldest"]);
    }

    #[test]
    fn test_update_same_source_replaces() {
        let store = BlogStore::new();
        store.upsert_entry(entry("post", "2021-06-03", false));

        let mut changed = entry("post", "2021-06-03", true);
        changed.title = "Edited".into();
        assert_eq!(store.upsert_entry(changed), Upsert::Updated);

        assert_eq!(store.entry_count(), 1);
        assert_eq!(store.entry("post").unwrap().title, "Edited");
        let archive = store.archive();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.bucket(2021, "06")[0].title, "Edited");
        assert_eq!(store.featured().len(), 1);
    }

    #[test]
    fn test_update_with_new_date_moves_bucket() {
        let store = BlogStore::new();
        store.upsert_entry(entry("post", "2021-06-03", false));
        store.upsert_entry(entry("post", "2021-08-01", false));

        let archive = store.archive();
        assert!(archive.bucket(2021, "06").is_empty());
        assert_eq!(archive.bucket(2021, "08").len(), 1);
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_update_with_new_url_drops_old_key() {
        let store = BlogStore::new();
        store.upsert_entry(entry("old-title", "2021-06-03", false));

        let mut renamed = entry("new-title", "2021-06-03", false);
        renamed.source = PathBuf::from("entries/old-title.md");
        assert_eq!(store.upsert_entry(renamed), Upsert::Updated);

        assert!(store.entry("old-title").is_none());
        assert!(store.entry("new-title").is_some());
        assert_eq!(store.entry_count(), 1);
        assert_eq!(store.archive().len(), 1);
    }

    #[test]
    fn test_url_collision_newer_file_wins() {
        let store = BlogStore::new();
        store.upsert_entry(entry("same", "2021-06-03", false));

        let mut other = entry("same", "2021-06-03", false);
        other.source = PathBuf::from("entries/copy.md");
        other.title = "Copy".into();
        store.upsert_entry(other);

        assert_eq!(store.entry_count(), 1);
        assert_eq!(store.archive().len(), 1);
        assert_eq!(store.entry("same").unwrap().title, "Copy");
        assert!(!store.contains_source(Path::new("entries/same.md")));
    }

    #[test]
    fn test_pages() {
        let store = BlogStore::new();
        assert_eq!(store.upsert_page(page("about", "pages/about.md")), Upsert::Inserted);
        assert_eq!(store.upsert_page(page("about", "pages/about.md")), Upsert::Updated);
        store.upsert_page(page("videos", "pages/videos.md"));

        assert_eq!(store.page_count(), 2);
        assert!(store.page("/about").is_some());
        let urls: Vec<_> = store.pages().iter().map(|p| p.url.clone()).collect();
        assert_eq!(urls, ["about", "videos"]);
        assert!(store.contains_source(Path::new("pages/about.md")));
    }

    #[test]
    fn test_remove_source() {
        let store = BlogStore::new();
        store.upsert_entry(entry("gone", "2021-06-03", true));

        assert_eq!(store.remove_source(Path::new("entries/gone.md")).as_deref(), Some("gone"));
        assert_eq!(store.entry_count(), 0);
        assert!(store.archive().is_empty());
        assert!(store.featured().is_empty());
        assert!(store.remove_source(Path::new("entries/gone.md")).is_none());
    }

    #[test]
    fn test_subscribers_receive_events() {
        let store = BlogStore::new();
        let rx = store.subscribe();

        store.upsert_entry(entry("a", "2021-06-03", false));
        store.upsert_page(page("about", "pages/about.md"));

        assert_eq!(rx.try_recv().unwrap(), StoreEvent::Entry { url: "a".into() });
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::Page { url: "about".into() });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let store = BlogStore::new();
        drop(store.subscribe());
        store.upsert_entry(entry("a", "2021-06-03", false));
        assert!(store.subscribers.lock().is_empty());
    }
}
