//! Network seam.
//!
//! The navigation controller fetches whole documents and the live session
//! reads a long-lived streaming body; both go through [`Transport`] so the
//! HTTP stack can be swapped out.

mod http;

#[cfg(test)]
pub mod fake;

pub use http::HttpTransport;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;
use url::Url;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot connect to {url}")]
    Connect {
        url: Url,
        #[source]
        source: BoxError,
    },

    #[error("{url} answered with status {status}")]
    Status { url: Url, status: u16 },

    #[error("failed reading the response body from {url}")]
    Body {
        url: Url,
        #[source]
        source: BoxError,
    },

    #[error("unsupported url `{0}`")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Parse a form `method` attribute; anything but `post` is a GET.
    pub fn from_form(value: Option<&str>) -> Self {
        match value {
            Some(m) if m.eq_ignore_ascii_case("post") => Self::Post,
            _ => Self::Get,
        }
    }
}

/// Request for a replacement document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    /// `application/x-www-form-urlencoded` body of a POST
    pub body: Option<String>,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            body: None,
        }
    }

    pub fn post(url: Url, body: String) -> Self {
        Self {
            method: Method::Post,
            url,
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: Url,
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`TransportError::Status`].
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                url: self.url,
                status: self.status,
            })
        }
    }
}

/// Request opening a streaming connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

/// Chunks of a streaming body as they arrive.
pub type BodyStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

pub struct StreamResponse {
    pub status: u16,
    pub body: BodyStream,
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl StreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError>;

    async fn open_stream(&self, request: StreamRequest) -> Result<StreamResponse, TransportError>;
}
