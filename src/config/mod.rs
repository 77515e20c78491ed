//! Configuration management for `pagesync.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── site       # [site]
//! │   ├── session    # [session]
//! │   ├── navigation # [navigation]
//! │   └── document   # [document]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # PageConfig (this file)
//! ```
//!
//! Every field has a default, so the file itself is optional.

pub mod section;
pub mod types;
mod util;

pub use section::{DocumentConfig, NavigationConfig, SessionConfig, SiteConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::live::{LiveMode, LiveOptions};
use crate::log;
use util::find_config_file;

/// Default config file name.
pub const CONFIG_FILE: &str = "pagesync.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing pagesync.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageConfig {
    /// Path the configuration was loaded from (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub document: DocumentConfig,
}

impl PageConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `pagesync.toml` is searched
    /// upward from the working directory, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(Path::new(CONFIG_FILE)),
        };
        let Some(path) = path else {
            crate::debug!("config"; "no {CONFIG_FILE} found, using defaults");
            return Ok(Self::default());
        };

        let mut config = Self::from_path(&path)?;
        config.config_path = Some(path);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Validate all sections, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.site.validate(&mut diag);
        self.session.validate(&mut diag);
        self.navigation.validate(&mut diag);
        self.document.validate(&mut diag);
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    // ========================================================================
    // Derived settings
    // ========================================================================

    /// Resolve a command-line URL, relative ones against `[site] origin`.
    pub fn resolve_url(&self, input: &str) -> Result<Url, url::ParseError> {
        match Url::parse(input) {
            Err(url::ParseError::RelativeUrlWithoutBase) => match self.site.origin_url() {
                Some(origin) => origin.join(input),
                None => Err(url::ParseError::RelativeUrlWithoutBase),
            },
            other => other,
        }
    }

    /// Live session options for a page at `page_url`.
    pub fn live_options(&self, page_url: &Url, mode: LiveMode) -> Result<LiveOptions, url::ParseError> {
        let url = page_url.join(&self.session.path)?;
        let mut options = LiveOptions::new(url, mode);
        options.interval = self.session.interval(mode);
        options.jitter = self.session.jitter;
        options.inactivity_timeout = self.session.inactivity_timeout();
        options.header = self.session.header.clone();
        Ok(options)
    }
}

/// Parse a config snippet for tests, failing on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PageConfig {
    let (parsed, ignored) = PageConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
