//! Site-wide index of entries, pages and the date archive.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  upsert_entry / upsert_page  ┌─────────────────────────┐
//! │   Indexer    │ ───────────────────────────► │        BlogStore        │
//! │ (watch.rs)   │                              │  entries   (url → Entry)│
//! └──────────────┘                              │  pages     (url → Page) │
//!                                               │  archive   (year/month) │
//!                                               │  featured               │
//!                                               └───────────┬─────────────┘
//!                                                           │ StoreEvent
//!                                                           ▼
//!                                                  reload hub, subscribers
//! ```

pub mod archive;
mod store;

pub use store::{BlogStore, StoreEvent, Upsert};
