//! `[base]` section configuration.
//!
//! Contains basic site information like title, author, description, etc.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in blog.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "Jonas Galvez"
/// description = "Writing about software"
/// url = "https://hire.jonasgalvez.com.br"
/// tag_domain = "hire.jonasgalvez.com.br"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title displayed in browser tab and headers.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,

    /// Site description for the feed and meta tags.
    #[serde(default)]
    pub description: String,

    /// Author name for the feed and meta tags.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// Base URL for absolute links in the feed.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// BCP 47 language code (e.g., "en-US", "pt-BR").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,

    /// Authority part of `tag:` URIs identifying entries in feeds.
    #[serde(default = "defaults::base::tag_domain")]
    #[educe(Default = defaults::base::tag_domain())]
    pub tag_domain: String,
}
