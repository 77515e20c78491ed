//! Configuration section definitions.
//!
//! | Section        | Purpose                                      |
//! |----------------|----------------------------------------------|
//! | `[site]`       | Origin for relative URLs                     |
//! | `[session]`    | Live session endpoint, mode and cadence      |
//! | `[navigation]` | Progress indicator and unsaved-edits prompt  |
//! | `[document]`   | Version marker and behavior attribute        |

mod document;
mod navigation;
mod session;
mod site;

pub use document::DocumentConfig;
pub use navigation::NavigationConfig;
pub use session::SessionConfig;
pub use site::SiteConfig;
