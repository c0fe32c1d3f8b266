//! Markdown content: front matter, rendering, entries and pages.
//!
//! ```text
//! source ──► frontmatter::split ──► YAML metadata ─┐
//!                                 └─► content ─────┼──► entry::build_entry ──► Entry
//!                                                  └──► page::build_page  ──► Page
//! ```

pub mod entry;
pub mod frontmatter;
pub mod markdown;
pub mod page;

pub use entry::{Entry, EntryOptions, build_entry};
pub use page::{Page, build_page};
