//! `[navigation]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [navigation]
//! progress_tick_ms = 200
//! confirm_message = "You have unsaved changes. Leave this page?"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::nav::NavOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Progress indicator tick.
    pub progress_tick_ms: u64,
    /// Prompt shown before discarding unsaved edits.
    pub confirm_message: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        let defaults = NavOptions::default();
        Self {
            progress_tick_ms: defaults.progress_tick.as_millis() as u64,
            confirm_message: defaults.confirm_message,
        }
    }
}

impl NavigationConfig {
    pub const PROGRESS_TICK_MS: FieldPath = FieldPath::new("navigation.progress_tick_ms");

    pub fn options(&self) -> NavOptions {
        NavOptions {
            progress_tick: Duration::from_millis(self.progress_tick_ms),
            confirm_message: self.confirm_message.clone(),
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.progress_tick_ms == 0 {
            diag.error(Self::PROGRESS_TICK_MS, "must be greater than zero");
        }
    }
}
