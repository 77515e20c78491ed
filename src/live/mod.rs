//! Live session.
//!
//! Holds a long-lived streaming connection to the server and mounts every
//! document it pushes. A reconnect [`BackgroundJob`] drives the loop, one
//! connection attempt per run:
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Idle -> ... (until stopped)
//!             |
//!             +-> failed: banner, retry after interval * (1 + jitter)
//! ```
//!
//! In [`LiveMode::ReloadWatch`] the session expects the server to go away
//! (a restart) and reloads the page as soon as it can connect again.

mod decode;

pub use decode::NdjsonDecoder;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::core::CancelToken;
use crate::dom::Document;
use crate::mount::{MountError, Mounter};
use crate::page::{Banner, BannerKind, Host, PageEvent, UpdateKind};
use crate::scheduler::BackgroundJob;
use crate::transport::{BodyStream, StreamRequest, Transport, TransportError};

#[derive(Debug, Error)]
pub enum LiveError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server refused the live session with status {0}")]
    Refused(u16),

    #[error("no data received for {0:?}")]
    Inactive(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveMode {
    /// Stream pushed updates, retry on failure
    #[default]
    Stream,
    /// Wait for a server restart, then reload the page
    ReloadWatch,
}

impl LiveMode {
    pub fn default_interval(self) -> Duration {
        match self {
            Self::Stream => Duration::from_secs(5),
            Self::ReloadWatch => Duration::from_secs(1),
        }
    }

    fn failure_banner(self) -> Banner {
        match self {
            Self::Stream => Banner::connection("Connection lost. Retrying..."),
            Self::ReloadWatch => Banner::reloading("Waiting for the server. The page will reload."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveStatus {
    Idle,
    Connecting,
    Streaming,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct LiveOptions {
    /// Stream endpoint
    pub url: Url,
    pub mode: LiveMode,
    /// Pause between connection attempts
    pub interval: Duration,
    pub jitter: f64,
    /// Rolling limit on silence, reset by every chunk
    pub inactivity_timeout: Duration,
    /// Header carrying the session id
    pub header: String,
}

impl LiveOptions {
    pub fn new(url: Url, mode: LiveMode) -> Self {
        Self {
            url,
            mode,
            interval: mode.default_interval(),
            jitter: 0.25,
            inactivity_timeout: Duration::from_secs(60),
            header: "x-live-session".into(),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

struct Session {
    id: String,
    options: LiveOptions,
    mounter: Mounter,
    transport: Arc<dyn Transport>,
    host: Arc<dyn Host>,
    token: CancelToken,
    status: Mutex<LiveStatus>,
    reload_on_open: AtomicBool,
    updates: AtomicUsize,
}

/// Handle to a running live session. Clones share the session.
#[derive(Clone)]
pub struct LiveSession {
    session: Arc<Session>,
    job: BackgroundJob,
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("id", &self.session.id)
            .field("status", &self.status())
            .field("job", &self.job.state())
            .finish()
    }
}

impl LiveSession {
    /// Start connecting right away on the current runtime.
    pub fn start(
        mounter: Mounter,
        transport: Arc<dyn Transport>,
        host: Arc<dyn Host>,
        options: LiveOptions,
    ) -> Self {
        let session = Arc::new(Session {
            id: Uuid::new_v4().to_string(),
            mounter,
            transport,
            host,
            token: CancelToken::new(),
            status: Mutex::new(LiveStatus::Idle),
            reload_on_open: AtomicBool::new(false),
            updates: AtomicUsize::new(0),
            options,
        });
        crate::debug!("live"; "session {} ({:?})", session.id, session.options.mode);

        let worker = Arc::clone(&session);
        let job = BackgroundJob::start(
            session.options.interval,
            session.options.jitter,
            move || {
                let session = Arc::clone(&worker);
                async move { session.attempt().await }
            },
        );
        Self { session, job }
    }

    /// Stop reconnecting and abort the current attempt.
    pub fn stop(&self) {
        self.job.stop();
        self.session.token.cancel();
        *self.session.status.lock() = LiveStatus::Stopped;
    }

    /// Skip the rest of the reconnect pause.
    pub fn reconnect_now(&self) {
        self.job.run();
    }

    pub fn id(&self) -> &str {
        &self.session.id
    }

    pub fn status(&self) -> LiveStatus {
        *self.session.status.lock()
    }

    /// Documents mounted so far.
    pub fn updates(&self) -> usize {
        self.session.updates.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.job.is_stopped()
    }
}

impl Session {
    fn set_status(&self, status: LiveStatus) {
        let mut current = self.status.lock();
        if *current != LiveStatus::Stopped {
            *current = status;
        }
    }

    /// One connection attempt, from connect to stream end.
    async fn attempt(&self) {
        if self.token.is_cancelled() {
            return;
        }
        self.set_status(LiveStatus::Connecting);

        let opened = tokio::select! {
            biased;
            _ = self.token.cancelled() => return,
            opened = self.connect() => opened,
        };
        let body = match opened {
            Ok(body) => body,
            Err(err) => {
                self.failed(&err);
                return;
            }
        };

        {
            let mut page = self.mounter.page().lock();
            page.clear_banner(&[BannerKind::Connection, BannerKind::Reloading]);
            if self.reload_on_open.swap(false, Ordering::SeqCst) {
                page.document.clear_modified();
                drop(page);
                crate::log!("live"; "server is back, reloading");
                self.set_status(LiveStatus::Idle);
                self.host.reload();
                return;
            }
        }

        self.set_status(LiveStatus::Streaming);
        crate::debug!("live"; "streaming from {}", self.options.url);
        if let Err(err) = self.consume(body).await {
            crate::log!("live"; "stream ended: {err}");
        }
        if self.options.mode == LiveMode::ReloadWatch {
            self.reload_on_open.store(true, Ordering::SeqCst);
        }
        self.set_status(LiveStatus::Idle);
    }

    async fn connect(&self) -> Result<BodyStream, LiveError> {
        let request = StreamRequest {
            url: self.options.url.clone(),
            headers: vec![(self.options.header.clone(), self.id.clone())],
        };
        let response = tokio::time::timeout(
            self.options.inactivity_timeout,
            self.transport.open_stream(request),
        )
        .await
        .map_err(|_| LiveError::Inactive(self.options.inactivity_timeout))??;

        if !response.is_success() {
            return Err(LiveError::Refused(response.status));
        }
        Ok(response.body)
    }

    /// Mount every document of the stream until it closes or times out.
    async fn consume(&self, mut body: BodyStream) -> Result<(), LiveError> {
        let timeout = self.options.inactivity_timeout;
        let mut decoder = NdjsonDecoder::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return Ok(()),
                next = tokio::time::timeout(timeout, body.next()) => next,
            };
            let chunk = match next {
                Err(_) => return Err(LiveError::Inactive(timeout)),
                Ok(None) => break,
                Ok(Some(chunk)) => chunk?,
            };
            for html in decoder.push(&chunk) {
                self.apply(&html);
            }
        }
        if let Some(html) = decoder.finish() {
            self.apply(&html);
        }
        Ok(())
    }

    fn apply(&self, html: &str) {
        if self.token.is_cancelled() {
            return;
        }
        let mut page = self.mounter.page().lock();
        let event = PageEvent::new(UpdateKind::Push, page.location.clone());
        match self
            .mounter
            .document_mount(&mut page, Document::parse(html), &event)
        {
            Ok(()) => {
                self.updates.fetch_add(1, Ordering::SeqCst);
            }
            // Banner already shown; later updates may match again
            Err(MountError::VersionSkew { .. }) => {}
            Err(err) => crate::log!("live"; "update failed: {err}"),
        }
    }

    fn failed(&self, err: &LiveError) {
        crate::debug!("live"; "connection attempt failed: {err}");
        self.mounter
            .page()
            .lock()
            .show_banner(self.options.mode.failure_banner());
        if self.options.mode == LiveMode::ReloadWatch {
            self.reload_on_open.store(true, Ordering::SeqCst);
        }
        self.set_status(LiveStatus::Idle);
    }
}

// ============================================================================
// Session slot
// ============================================================================

/// Holds the one active live session.
#[derive(Debug, Default)]
pub struct LiveSessions {
    current: Mutex<Option<LiveSession>>,
}

impl LiveSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the active session, then start a new one in its place.
    pub fn start(
        &self,
        mounter: Mounter,
        transport: Arc<dyn Transport>,
        host: Arc<dyn Host>,
        options: LiveOptions,
    ) -> LiveSession {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.stop();
        }
        let session = LiveSession::start(mounter, transport, host, options);
        *current = Some(session.clone());
        session
    }

    /// Tear down the active session. Returns whether there was one.
    pub fn stop(&self) -> bool {
        match self.current.lock().take() {
            Some(session) => {
                session.stop();
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<LiveSession> {
        self.current.lock().clone()
    }
}
