//! Page model.
//!
//! Everything a browser tab would own besides the network: the live
//! document, the current location, session history, the persistent
//! banner, the navigation progress indicator and page-global listeners.
//!
//! # Module Structure
//!
//! - `history` - Session history entries
//! - `banner` - Persistent user-visible banner
//! - `jobs` - Element-owned background jobs
//! - `host` - Effects outside the page (confirm prompt, hard reload)

mod banner;
mod history;
mod host;
mod jobs;

pub use banner::{Banner, BannerKind};
pub use history::History;
pub use host::Host;
pub use jobs::AttachedJobs;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use crate::dom::{Document, NodeId};
use crate::morph::UpdateMode;

/// Page shared between the navigation controller, the live session and
/// background jobs. Never held across an await.
pub type SharedPage = Arc<Mutex<Page>>;

/// What kind of update a [`PageEvent`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Document replaced after a client navigation
    Navigation,
    /// Document replaced by a live-session push
    Push,
    /// Markup mounted into a container
    Mount,
}

impl UpdateKind {
    pub fn mode(self) -> UpdateMode {
        match self {
            Self::Push => UpdateMode::Push,
            Self::Navigation | Self::Mount => UpdateMode::Navigation,
        }
    }
}

/// Event dispatched to page-global listeners after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEvent {
    pub kind: UpdateKind,
    pub url: Url,
}

impl PageEvent {
    pub fn new(kind: UpdateKind, url: Url) -> Self {
        Self { kind, url }
    }

    pub fn is_push(&self) -> bool {
        self.kind == UpdateKind::Push
    }
}

type Listener = Box<dyn Fn(&PageEvent) + Send>;

/// Live page state.
pub struct Page {
    pub document: Document,
    pub location: Url,
    pub history: History,
    pub banner: Option<Banner>,
    /// Navigation progress in `[0, 1)`; `None` hides the indicator
    pub progress: Option<f64>,
    pub focused: Option<NodeId>,
    pub scrolled_to: Option<NodeId>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("location", &self.location.as_str())
            .field("history", &self.history)
            .field("banner", &self.banner)
            .field("progress", &self.progress)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Page showing `document` at `location`, with one history entry.
    pub fn new(location: Url, document: Document) -> Self {
        Self {
            document,
            history: History::new(location.clone()),
            location,
            banner: None,
            progress: None,
            focused: None,
            scrolled_to: None,
            listeners: Vec::new(),
        }
    }

    pub fn shared(self) -> SharedPage {
        Arc::new(Mutex::new(self))
    }

    /// Register a page-global listener.
    pub fn listen(&mut self, listener: impl Fn(&PageEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn dispatch(&self, event: &PageEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// Show a banner, replacing any current one.
    pub fn show_banner(&mut self, banner: Banner) {
        if self.banner.as_ref() != Some(&banner) {
            crate::debug!("page"; "banner: {}", banner.message);
        }
        self.banner = Some(banner);
    }

    /// Hide the banner if it is of one of the given kinds.
    pub fn clear_banner(&mut self, kinds: &[BannerKind]) {
        if self.banner.as_ref().is_some_and(|b| kinds.contains(&b.kind)) {
            self.banner = None;
        }
    }

    /// Push a history entry and make it the current location.
    pub fn push_history(&mut self, url: Url) {
        self.history.push(url.clone());
        self.location = url;
    }

    /// Focus the first connected element carrying `autofocus`.
    pub fn focus_autofocus(&mut self) {
        if let Some(id) = self.document.find(|el| el.attrs.contains("autofocus")) {
            self.focused = Some(id);
        }
    }

    /// Scroll the element with the given id into view.
    pub fn scroll_to_id(&mut self, id: &str) -> bool {
        match self.document.find_by_id(id) {
            Some(node) => {
                self.scrolled_to = Some(node);
                true
            }
            None => false,
        }
    }
}
