//! Navigation controller.
//!
//! Intercepts same-origin link clicks and form submissions, fetches the
//! replacement document and mounts it over the live page.
//!
//! At most one navigation is in flight: starting one cancels the previous
//! one before any further work, so the document never receives two
//! overlapping replacements. A superseded navigation ends silently with
//! [`NavOutcome::Cancelled`].

mod form;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use url::Url;

use crate::core::{CancelToken, fragment_id, same_document, same_origin};
use crate::dom::{Document, NodeId};
use crate::mount::{MountError, Mounter};
use crate::page::{Banner, BannerKind, Host, PageEvent, SharedPage, UpdateKind};
use crate::scheduler::BackgroundJob;
use crate::transport::{FetchRequest, FetchResponse, Method, Transport, TransportError};

/// Fraction of the remaining distance the progress bar covers per tick.
const PROGRESS_STEP: f64 = 0.2;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("invalid url `{href}`")]
    InvalidUrl {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("element is not a form")]
    NotAForm,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Mount(#[from] MountError),
}

impl NavError {
    fn is_version_skew(&self) -> bool {
        matches!(self, Self::Mount(MountError::VersionSkew { .. }))
    }
}

/// How a navigation ended without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// New document mounted
    Completed,
    /// Superseded by a newer navigation
    Cancelled,
    /// The user refused to discard unsaved edits
    Declined,
    /// Cross-origin target, left to the browser
    Ignored,
    /// Fragment-only change, scrolled without fetching
    Scrolled,
    /// Form has invalid controls
    Blocked,
}

/// What triggered a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavSource {
    Link,
    Form { programmatic: bool },
    /// Back/forward through history
    PopState,
}

impl NavSource {
    /// Whether unsaved edits must be confirmed before leaving.
    fn guarded(self) -> bool {
        match self {
            Self::Link => true,
            Self::Form { programmatic } => !programmatic,
            Self::PopState => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavRequest {
    pub fetch: FetchRequest,
    pub source: NavSource,
}

impl NavRequest {
    pub fn link(url: Url) -> Self {
        Self {
            fetch: FetchRequest::get(url),
            source: NavSource::Link,
        }
    }

    /// A plain GET not replaying history.
    fn is_plain_get(&self) -> bool {
        self.fetch.method == Method::Get && self.source != NavSource::PopState
    }
}

#[derive(Debug, Clone)]
pub struct NavOptions {
    pub progress_tick: Duration,
    pub confirm_message: String,
}

impl Default for NavOptions {
    fn default() -> Self {
        Self {
            progress_tick: Duration::from_millis(200),
            confirm_message: "You have unsaved changes. Leave this page?".into(),
        }
    }
}

pub struct Navigator {
    page: SharedPage,
    mounter: Mounter,
    transport: Arc<dyn Transport>,
    host: Arc<dyn Host>,
    options: NavOptions,
    inflight: Mutex<Option<CancelToken>>,
}

impl Navigator {
    pub fn new(
        mounter: Mounter,
        transport: Arc<dyn Transport>,
        host: Arc<dyn Host>,
        options: NavOptions,
    ) -> Self {
        Self {
            page: Arc::clone(mounter.page()),
            mounter,
            transport,
            host,
            options,
            inflight: Mutex::new(None),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.inflight.lock().is_some()
    }

    /// Abandon the in-flight navigation, if any.
    pub fn cancel(&self) {
        let token = self.inflight.lock().take();
        if let Some(token) = token {
            token.cancel();
            self.page.lock().progress = None;
        }
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Follow a link as if the user clicked it.
    pub async fn click_link(&self, href: &str) -> Result<NavOutcome, NavError> {
        let url = self.resolve(href)?;
        let location = self.page.lock().location.clone();

        if !same_origin(&url, &location) {
            crate::debug!("nav"; "leaving for {url}");
            return Ok(NavOutcome::Ignored);
        }
        if same_document(&url, &location) && url.fragment().is_some() {
            let mut page = self.page.lock();
            if url != page.location {
                page.push_history(url.clone());
            }
            if let Some(id) = fragment_id(&url) {
                page.scroll_to_id(&id);
            }
            return Ok(NavOutcome::Scrolled);
        }

        self.navigate(NavRequest::link(url)).await
    }

    /// Submit a form of the live document.
    ///
    /// `programmatic` submissions skip the unsaved-edits prompt.
    pub async fn submit_form(
        &self,
        form: NodeId,
        programmatic: bool,
    ) -> Result<NavOutcome, NavError> {
        let fetch = {
            let page = self.page.lock();
            let is_form = page.document.element(form).is_some_and(|el| el.tag == "form");
            if !is_form {
                return Err(NavError::NotAForm);
            }
            if form::has_invalid(&page.document, form) {
                crate::debug!("nav"; "form has invalid controls, not submitted");
                return Ok(NavOutcome::Blocked);
            }
            form::request(&page.document, form, &page.location).map_err(|source| {
                NavError::InvalidUrl {
                    href: page
                        .document
                        .element(form)
                        .and_then(|el| el.attrs.get("action"))
                        .unwrap_or_default()
                        .to_string(),
                    source,
                }
            })?
        };

        let location = self.page.lock().location.clone();
        if !same_origin(&fetch.url, &location) {
            return Ok(NavOutcome::Ignored);
        }

        self.navigate(NavRequest {
            fetch,
            source: NavSource::Form { programmatic },
        })
        .await
    }

    /// The history cursor moved to `url`; show that entry.
    pub async fn pop_state(&self, url: Url) -> Result<NavOutcome, NavError> {
        let same = {
            let mut page = self.page.lock();
            let same = same_document(&url, &page.location);
            page.location = url.clone();
            if same && let Some(id) = fragment_id(&url) {
                page.scroll_to_id(&id);
            }
            same
        };
        if same {
            return Ok(NavOutcome::Scrolled);
        }

        self.navigate(NavRequest {
            fetch: FetchRequest::get(url),
            source: NavSource::PopState,
        })
        .await
    }

    pub async fn back(&self) -> Result<Option<NavOutcome>, NavError> {
        let url = self.page.lock().history.back().cloned();
        match url {
            Some(url) => self.pop_state(url).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn forward(&self) -> Result<Option<NavOutcome>, NavError> {
        let url = self.page.lock().history.forward().cloned();
        match url {
            Some(url) => self.pop_state(url).await.map(Some),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Navigation session
    // ========================================================================

    /// Fetch and mount a replacement document.
    pub async fn navigate(&self, request: NavRequest) -> Result<NavOutcome, NavError> {
        let busy = self.is_busy();
        let modified = self.page.lock().document.has_modified();
        if request.source.guarded()
            && modified
            && !busy
            && !self.host.confirm(&self.options.confirm_message)
        {
            return Ok(NavOutcome::Declined);
        }

        let token = self.begin();
        // Cleans up even if this future is dropped mid-flight
        let _session = Session {
            nav: self,
            token: token.clone(),
            progress: self.start_progress(),
        };
        crate::debug!("nav"; "fetching {}", request.fetch.url);

        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.transport.fetch(request.fetch.clone()) => Some(result),
        };

        let outcome = match fetched {
            None => Ok(NavOutcome::Cancelled),
            Some(result) => match result.and_then(FetchResponse::error_for_status) {
                Ok(response) => self.complete(&request, &token, response),
                Err(e) => Err(NavError::from(e)),
            },
        };

        if let Err(err) = &outcome {
            self.fail(&request, err);
        }
        outcome
    }

    /// Cancel the current session and install a new token.
    fn begin(&self) -> CancelToken {
        let token = CancelToken::new();
        if let Some(previous) = self.inflight.lock().replace(token.clone()) {
            crate::debug!("nav"; "superseding in-flight navigation");
            previous.cancel();
        }
        token
    }

    /// Clear the token and progress bar if `token` is still current.
    fn end(&self, token: &CancelToken) {
        let current = {
            let mut inflight = self.inflight.lock();
            let current = inflight.as_ref().is_some_and(|t| t.same_as(token));
            if current {
                *inflight = None;
            }
            current
        };
        if current {
            self.page.lock().progress = None;
        }
    }

    fn start_progress(&self) -> BackgroundJob {
        self.page.lock().progress = Some(0.0);
        let page = Arc::clone(&self.page);
        BackgroundJob::start(self.options.progress_tick, 0.0, move || {
            {
                let mut page = page.lock();
                if let Some(p) = page.progress {
                    page.progress = Some(p + (1.0 - p) * PROGRESS_STEP);
                }
            }
            async {}
        })
    }

    fn complete(
        &self,
        request: &NavRequest,
        token: &CancelToken,
        response: FetchResponse,
    ) -> Result<NavOutcome, NavError> {
        let mut page = self.page.lock();
        if token.is_cancelled() {
            return Ok(NavOutcome::Cancelled);
        }

        let mut url = response.url;
        if url.fragment().is_none() {
            url.set_fragment(request.fetch.url.fragment());
        }
        if same_document(&url, &page.location) {
            page.history.replace(url.clone());
            page.location = url.clone();
        } else {
            page.push_history(url.clone());
        }

        let event = PageEvent::new(UpdateKind::Navigation, url.clone());
        self.mounter
            .document_mount(&mut page, Document::parse(&response.body), &event)?;

        page.clear_banner(&[BannerKind::Error]);
        if let Some(id) = fragment_id(&url) {
            page.scroll_to_id(&id);
        }
        page.focus_autofocus();
        crate::log!("nav"; "{url}");
        Ok(NavOutcome::Completed)
    }

    fn fail(&self, request: &NavRequest, err: &NavError) {
        crate::log!("error"; "navigation to {} failed: {err}", request.fetch.url);
        let mut page = self.page.lock();
        if request.is_plain_get() && !same_document(&request.fetch.url, &page.location) {
            page.push_history(request.fetch.url.clone());
        }
        // The version banner already says what to do
        if !err.is_version_skew() {
            page.show_banner(Banner::error(format!("Could not load the page: {err}")));
        }
    }

    fn resolve(&self, href: &str) -> Result<Url, NavError> {
        self.page
            .lock()
            .location
            .join(href)
            .map_err(|source| NavError::InvalidUrl {
                href: href.to_string(),
                source,
            })
    }
}

/// One navigation's claim on the in-flight slot and progress bar.
struct Session<'a> {
    nav: &'a Navigator,
    token: CancelToken,
    progress: BackgroundJob,
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.progress.stop();
        self.nav.end(&self.token);
    }
}
