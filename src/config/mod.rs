//! Site configuration management for `blog.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[base]`    | Site metadata (title, author, url, tag domain)   |
//! | `[build]`   | Content directories, output, routes, covers      |
//! | `[serve]`   | Development server (port, interface, watch)      |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Blog"
//! url = "https://example.com"
//!
//! [build]
//! entries = "entries"
//! output = "dist"
//!
//! [serve]
//! port = 3000
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod serve;

use base::BaseConfig;
use build::BuildConfig;
use error::ConfigError;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing blog.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Index `drafts/*.md` alongside entries (CLI `--drafts`)
    #[serde(skip)]
    pub drafts: bool,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let config =
            Self::from_str(&content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        self.drafts = cli.drafts;
        self.resolve_paths(&root);
        self.config_path = Self::normalize_path(&self.get_root().join(&cli.config));

        match &cli.command {
            Commands::Serve {
                interface,
                port,
                watch,
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
            }
            Commands::Build { clean } => {
                self.build.clean |= *clean;
            }
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make every directory absolute under `root`.
    pub fn resolve_paths(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        let build = &mut self.build;

        for dir in [
            &mut build.entries,
            &mut build.drafts,
            &mut build.pages,
            &mut build.public,
            &mut build.images,
            &mut build.output,
            &mut build.cover_template,
        ] {
            *dir = Self::normalize_path(&root.join(&*dir));
        }

        build.root = Some(root);
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Base URL without trailing slash, falling back to the dev server address.
    pub fn site_url(&self) -> String {
        match &self.base.url {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => format!("http://{}:{}", self.serve.interface, self.serve.port),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.base.tag_domain.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[base.tag_domain] must not be empty".into()
            ));
        }

        if self.build.excerpt_separator.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[build.excerpt_separator] must not be empty".into()
            ));
        }

        if let Some(route) = self.build.routes.iter().find(|r| !r.starts_with('/')) {
            bail!(ConfigError::Validation(format!(
                "[build.routes] entry `{route}` must start with `/`"
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
