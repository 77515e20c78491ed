//! Persistent banner shown to the user.

/// Why the banner is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// A navigation or mount failed
    Error,
    /// The live session cannot reach the server, retrying
    Connection,
    /// The live session waits for the server, then reloads
    Reloading,
    /// The server runs a different version than this page
    VersionSkew,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn new(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Error, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Connection, message)
    }

    pub fn reloading(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Reloading, message)
    }

    pub fn version_skew() -> Self {
        Self::new(
            BannerKind::VersionSkew,
            "A newer version of this page is available. Reload to continue.",
        )
    }
}
