//! `reqwest`-backed transport.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use super::{
    FetchRequest, FetchResponse, Method, StreamRequest, StreamResponse, Transport, TransportError,
};

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pagesync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

fn check_scheme(url: &Url) -> Result<(), TransportError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(TransportError::InvalidUrl(url.to_string())),
    }
}

fn connect_error(url: &Url) -> impl FnOnce(reqwest::Error) -> TransportError + '_ {
    move |e| TransportError::Connect {
        url: url.clone(),
        source: e.into(),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        check_scheme(&request.url)?;

        let builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self
                .client
                .post(request.url.clone())
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(request.body.unwrap_or_default()),
        };
        let response = builder
            .header(ACCEPT, "text/html")
            .send()
            .await
            .map_err(connect_error(&request.url))?;

        let url = response.url().clone();
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError::Body {
            url: url.clone(),
            source: e.into(),
        })?;

        Ok(FetchResponse { url, status, body })
    }

    async fn open_stream(&self, request: StreamRequest) -> Result<StreamResponse, TransportError> {
        check_scheme(&request.url)?;

        let mut builder = self
            .client
            .get(request.url.clone())
            .header(ACCEPT, "application/x-ndjson");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder.send().await.map_err(connect_error(&request.url))?;

        let status = response.status().as_u16();
        let url = request.url;
        let body = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map(|bytes| bytes.to_vec()).map_err(|e| TransportError::Body {
                    url: url.clone(),
                    source: e.into(),
                })
            })
            .boxed();

        Ok(StreamResponse { status, body })
    }
}
