//! Command-line interface module.

mod args;
mod common;
pub mod morph;
pub mod open;
pub mod watch;

pub use args::{Cli, Commands};
