//! Effects that reach outside the page.

/// Embedding environment: user prompts and hard reloads.
pub trait Host: Send + Sync {
    /// Ask the user to confirm; `true` to proceed.
    fn confirm(&self, message: &str) -> bool;

    /// Throw the page away and load it again from scratch.
    fn reload(&self);
}
