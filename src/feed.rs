//! RSS 2.0 feed of all entries, newest first.

use crate::{
    config::SiteConfig, content::Entry, data::BlogStore, log, utils::date::to_rfc2822,
};
use anyhow::{Result, anyhow};
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder, validation::Validate};
use std::{fs, path::Path};

const GENERATOR: &str = concat!("inkwell ", env!("CARGO_PKG_VERSION"));

/// Render the feed XML for every indexed entry.
pub fn build_feed(store: &BlogStore, config: &SiteConfig) -> Result<String> {
    let site_url = config.site_url();
    let items: Vec<_> = store
        .entries()
        .iter()
        .map(|entry| feed_item(entry, &site_url, &config.base.author))
        .collect();

    let channel = ChannelBuilder::default()
        .title(config.base.title.clone())
        .link(site_url.clone())
        .description(config.base.description.clone())
        .language(config.base.language.clone())
        .generator(GENERATOR.to_owned())
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("rss validate: {e}"))?;

    Ok(channel.to_string())
}

fn feed_item(entry: &Entry, site_url: &str, author: &str) -> Item {
    let link = format!("{site_url}/{}", entry.url);
    ItemBuilder::default()
        .title(entry.title.clone())
        .link(link)
        .guid(
            GuidBuilder::default()
                .permalink(false)
                .value(entry.id.clone())
                .build(),
        )
        .description((!entry.excerpt.is_empty()).then(|| entry.excerpt.clone()))
        .pub_date(to_rfc2822(&entry.date))
        .author((!author.is_empty()).then(|| author.to_owned()))
        .build()
}

/// Write `feed.xml` into `dir`.
pub fn write_feed(store: &BlogStore, config: &SiteConfig, dir: &Path) -> Result<()> {
    let xml = build_feed(store, config)?;
    fs::create_dir_all(dir)?;
    fs::write(dir.join("feed.xml"), xml)?;

    log!("build"; "feed.xml ({} entries)", store.entry_count());
    Ok(())
}
