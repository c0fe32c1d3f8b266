//! Inkwell - a personal blog engine for markdown entries.

mod cli;
mod config;
mod content;
mod cover;
mod data;
mod error;
mod feed;
mod generate;
mod reload;
mod render;
mod serve;
mod utils;
mod watch;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use cover::CoverRenderer;
use data::BlogStore;
use generate::build_site;
use serve::serve_site;
use std::{path::Path, sync::Arc};
use watch::{Indexer, index_site};

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(load_config(cli)?));

    let store = Arc::new(BlogStore::new());
    let indexer = Indexer::new(Arc::clone(&store), config);
    let errors = index_site(config, &indexer);

    let covers = CoverRenderer::load(&config.build.cover_template)?;

    if !errors.is_empty() {
        if !cli.is_serve() {
            bail!("{} file(s) failed to parse", errors.len());
        }
        log!("index"; "{} file(s) failed to parse, serving the rest", errors.len());
    }

    match &cli.command {
        Commands::Build { .. } => build_site(config, &store, &covers),
        Commands::Serve { .. } => serve_site(config, indexer, Arc::new(covers)),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let found = config_path.exists();
    let mut config = if found {
        SiteConfig::from_path(&config_path)?
    } else {
        log!("config"; "{} not found, using defaults", config_path.display());
        SiteConfig::default()
    };
    config.update_with_cli(cli);
    config.validate()?;

    if found {
        log!("config"; "loaded {}", config.config_path.display());
    }

    Ok(config)
}
