//! Utility modules for the blog engine.

pub mod date;
pub mod escape;
pub mod log;
pub mod slug;
