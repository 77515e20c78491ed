//! `[session]` section configuration.
//!
//! Live session settings.
//!
//! # Example
//!
//! ```toml
//! [session]
//! path = "/_live"                 # Stream endpoint, relative to the page origin
//! mode = "stream"                 # "stream" or "reload-watch"
//! interval_ms = 5000              # Reconnect pause in stream mode
//! reload_interval_ms = 1000       # Reconnect pause in reload-watch mode
//! jitter = 0.25                   # Extra random fraction of the pause
//! inactivity_timeout_ms = 60000   # Abort an attempt after this much silence
//! header = "x-live-session"       # Header carrying the session id
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::live::LiveMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: String,
    pub mode: LiveMode,
    pub interval_ms: u64,
    pub reload_interval_ms: u64,
    pub jitter: f64,
    pub inactivity_timeout_ms: u64,
    pub header: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "/_live".into(),
            mode: LiveMode::Stream,
            interval_ms: 5000,
            reload_interval_ms: 1000,
            jitter: 0.25,
            inactivity_timeout_ms: 60_000,
            header: "x-live-session".into(),
        }
    }
}

impl SessionConfig {
    pub const PATH: FieldPath = FieldPath::new("session.path");
    pub const INTERVAL_MS: FieldPath = FieldPath::new("session.interval_ms");
    pub const RELOAD_INTERVAL_MS: FieldPath = FieldPath::new("session.reload_interval_ms");
    pub const JITTER: FieldPath = FieldPath::new("session.jitter");
    pub const INACTIVITY_TIMEOUT_MS: FieldPath = FieldPath::new("session.inactivity_timeout_ms");
    pub const HEADER: FieldPath = FieldPath::new("session.header");

    /// Reconnect pause for `mode`.
    pub fn interval(&self, mode: LiveMode) -> Duration {
        match mode {
            LiveMode::Stream => Duration::from_millis(self.interval_ms),
            LiveMode::ReloadWatch => Duration::from_millis(self.reload_interval_ms),
        }
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.path.is_empty() {
            diag.error(Self::PATH, "stream path must not be empty");
        }
        for (field, value) in [
            (Self::INTERVAL_MS, self.interval_ms),
            (Self::RELOAD_INTERVAL_MS, self.reload_interval_ms),
            (Self::INACTIVITY_TIMEOUT_MS, self.inactivity_timeout_ms),
        ] {
            if value == 0 {
                diag.error(field, "must be greater than zero");
            }
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            diag.error_with_hint(
                Self::JITTER,
                format!("invalid jitter {}", self.jitter),
                "use a fraction between 0 and 1, such as 0.25",
            );
        }
        let valid_header = !self.header.is_empty()
            && self
                .header
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid_header {
            diag.error(Self::HEADER, format!("`{}` is not a valid header name", self.header));
        }
    }
}
