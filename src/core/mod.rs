//! Core types - pure abstractions shared across the codebase.

mod cancel;
mod location;
mod shutdown;

pub use cancel::CancelToken;
pub use location::{fragment_id, same_document, same_origin};
pub use shutdown::{setup_shutdown_handler, shutdown_token};
