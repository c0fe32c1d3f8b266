//! Blog error taxonomy.
//!
//! Parse errors are fatal for the offending file at scan time. Not-found and
//! render errors are scoped to a single request.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("{}: {reason}", file.display())]
    Parse { file: PathBuf, reason: String },

    #[error("not found: /{0}")]
    NotFound(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("IO error when reading `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BlogError {
    pub fn parse(file: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code for this error when it escapes a request.
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }
}

pub type BlogResult<T> = std::result::Result<T, BlogError>;
