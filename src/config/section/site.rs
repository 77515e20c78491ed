//! `[site]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [site]
//! origin = "https://example.com"   # Base for relative URLs on the command line
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin that relative URLs are resolved against.
    pub origin: Option<String>,
}

impl SiteConfig {
    pub const ORIGIN: FieldPath = FieldPath::new("site.origin");

    /// Parsed origin, if configured and valid.
    pub fn origin_url(&self) -> Option<Url> {
        self.origin.as_deref().and_then(|o| Url::parse(o).ok())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let Some(origin) = &self.origin else {
            return;
        };
        match Url::parse(origin) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => diag.error(Self::ORIGIN, "origin must be an http(s) URL"),
            Err(e) => diag.error_with_hint(
                Self::ORIGIN,
                format!("invalid URL `{origin}`: {e}"),
                "use a full URL such as \"https://example.com\"",
            ),
        }
    }
}
