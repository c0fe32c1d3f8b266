//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "My Blog".into()
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn url() -> Option<String> {
        None
    }

    pub fn language() -> String {
        "en-US".into()
    }

    pub fn tag_domain() -> String {
        "hire.jonasgalvez.com.br".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn entries() -> PathBuf {
        "entries".into()
    }

    pub fn drafts() -> PathBuf {
        "drafts".into()
    }

    pub fn pages() -> PathBuf {
        "pages".into()
    }

    pub fn public() -> PathBuf {
        "public".into()
    }

    pub fn images() -> PathBuf {
        "public/images".into()
    }

    pub fn output() -> PathBuf {
        "dist".into()
    }

    pub fn cover_template() -> PathBuf {
        "assets/article.svg".into()
    }

    pub fn excerpt_separator() -> String {
        "---".into()
    }

    pub fn routes() -> Vec<String> {
        ["/", "/about", "/archive", "/videos", "/influences"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        3000
    }

    pub fn reload_port() -> u16 {
        24678
    }
}
