//! `[document]` section configuration.
//!
//! Markup conventions shared with the server.
//!
//! # Example
//!
//! ```toml
//! [document]
//! version_meta = "version"          # <meta name="version" content="...">
//! behavior_attr = "data-behavior"   # <div data-behavior='["name", ...]'>
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::mount::MountOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub version_meta: String,
    pub behavior_attr: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        let defaults = MountOptions::default();
        Self {
            version_meta: defaults.version_meta,
            behavior_attr: defaults.behavior_attr,
        }
    }
}

impl DocumentConfig {
    pub const VERSION_META: FieldPath = FieldPath::new("document.version_meta");
    pub const BEHAVIOR_ATTR: FieldPath = FieldPath::new("document.behavior_attr");

    pub fn options(&self) -> MountOptions {
        MountOptions {
            version_meta: self.version_meta.clone(),
            behavior_attr: self.behavior_attr.to_ascii_lowercase(),
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.version_meta.is_empty() {
            diag.error(Self::VERSION_META, "must not be empty");
        }
        if self.behavior_attr.is_empty() || self.behavior_attr.contains(char::is_whitespace) {
            diag.error(
                Self::BEHAVIOR_ATTR,
                format!("`{}` is not a valid attribute name", self.behavior_attr),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_document_config() {
        let config = test_parse_config("[document]\nbehavior_attr = \"Data-Run\"");
        let options = config.document.options();
        assert_eq!(options.behavior_attr, "data-run");
        assert_eq!(options.version_meta, "version");
    }
}
