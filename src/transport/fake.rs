//! Scripted transport for tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::time::Instant;
use url::Url;

use super::{FetchRequest, FetchResponse, StreamRequest, StreamResponse, Transport, TransportError};

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
    pub redirect: Option<Url>,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
            redirect: None,
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn redirect(mut self, url: &str) -> Self {
        self.redirect = Some(Url::parse(url).unwrap());
        self
    }
}

/// Outcome of one `open_stream` call.
#[derive(Debug, Clone)]
pub enum Script {
    /// Connection refused before any response
    Refuse,
    /// Response with a non-success status
    Status(u16),
    /// 200 response delivering these chunks; `hang` keeps the body open
    Chunks { chunks: Vec<String>, hang: bool },
}

#[derive(Debug, Default)]
struct State {
    pages: FxHashMap<String, Reply>,
    fetches: Vec<FetchRequest>,
    scripts: VecDeque<Script>,
    streams: Vec<(Instant, StreamRequest)>,
}

#[derive(Debug, Default)]
pub struct FakeTransport {
    state: Mutex<State>,
}

fn page_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `reply` for a path (with optional `?query`).
    pub fn page(&self, path: &str, reply: Reply) -> &Self {
        self.state.lock().pages.insert(path.to_string(), reply);
        self
    }

    pub fn script(&self, script: Script) -> &Self {
        self.state.lock().scripts.push_back(script);
        self
    }

    pub fn fetches(&self) -> Vec<FetchRequest> {
        self.state.lock().fetches.clone()
    }

    /// When each stream was opened, with its request.
    pub fn streams(&self) -> Vec<(Instant, StreamRequest)> {
        self.state.lock().streams.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        let reply = {
            let mut state = self.state.lock();
            state.fetches.push(request.clone());
            state.pages.get(&page_key(&request.url)).cloned()
        };
        let Some(reply) = reply else {
            return Ok(FetchResponse {
                url: request.url,
                status: 404,
                body: String::new(),
            });
        };

        tokio::time::sleep(reply.delay).await;
        Ok(FetchResponse {
            url: reply.redirect.unwrap_or(request.url),
            status: reply.status,
            body: reply.body,
        })
    }

    async fn open_stream(&self, request: StreamRequest) -> Result<StreamResponse, TransportError> {
        let script = {
            let mut state = self.state.lock();
            state.streams.push((Instant::now(), request.clone()));
            state.scripts.pop_front()
        };

        match script {
            None | Some(Script::Refuse) => Err(TransportError::Connect {
                url: request.url,
                source: "connection refused".into(),
            }),
            Some(Script::Status(status)) => Ok(StreamResponse {
                status,
                body: stream::empty().boxed(),
            }),
            Some(Script::Chunks { chunks, hang }) => {
                let body = stream::iter(chunks.into_iter().map(|chunk| Ok(chunk.into_bytes())));
                let body = if hang {
                    body.chain(stream::pending()).boxed()
                } else {
                    body.boxed()
                };
                Ok(StreamResponse { status: 200, body })
            }
        }
    }
}
