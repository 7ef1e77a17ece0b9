//! Fetch capability used by every pipeline stage.
//!
//! The [`Fetcher`] trait is the seam between the pipeline and the network:
//! search pages, details pages, mirror pages, and the final asset all go
//! through one `fetch(url, options)` call. [`HttpFetcher`] is the reqwest
//! implementation; tests substitute scripted fetchers.
//!
//! There is deliberately no caching layer. Catalog content changes and a stale
//! page would resolve to the wrong download.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use bookfetch_core::fetch::{FetchOptions, Fetcher, HttpFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new()?;
//! let page = fetcher
//!     .fetch("https://example.com/search?q=atomic+habits", &FetchOptions::text(Duration::from_secs(10)))
//!     .await?;
//! println!("{} bytes of HTML", page.into_text()?.len());
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::{BoxedCause, FetchError};

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, stream};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};
use url::Url;

use crate::user_agent;

/// Connect timeout for the shared client; total timeouts are per call.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Maximum redirects followed by a single fetch.
const MAX_REDIRECTS: usize = 10;

/// Chunked body stream handed to sinks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, FetchError>> + Send>>;

/// How the caller wants the response body delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Whole body decoded as (lossy) UTF-8.
    Text,
    /// Whole body buffered as bytes.
    Binary,
    /// Body delivered chunk by chunk.
    Stream,
}

/// Per-call request options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Total timeout for the request, body included.
    pub timeout: Duration,
    /// Body delivery mode.
    pub response_kind: ResponseKind,
    /// Extra request headers (name, value).
    pub headers: Vec<(String, String)>,
    /// Optional byte ceiling for the body.
    pub max_bytes: Option<u64>,
}

impl FetchOptions {
    /// Options for a text (HTML/JSON) fetch.
    #[must_use]
    pub fn text(timeout: Duration) -> Self {
        Self::with_kind(timeout, ResponseKind::Text)
    }

    /// Options for a buffered binary fetch.
    #[must_use]
    pub fn binary(timeout: Duration) -> Self {
        Self::with_kind(timeout, ResponseKind::Binary)
    }

    /// Options for a streamed fetch.
    #[must_use]
    pub fn stream(timeout: Duration) -> Self {
        Self::with_kind(timeout, ResponseKind::Stream)
    }

    fn with_kind(timeout: Duration, response_kind: ResponseKind) -> Self {
        Self {
            timeout,
            response_kind,
            headers: Vec::new(),
            max_bytes: None,
        }
    }

    /// Adds a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds several request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets the byte ceiling.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Response body in the requested delivery mode.
pub enum Payload {
    /// Decoded text.
    Text(String),
    /// Buffered bytes.
    Binary(Vec<u8>),
    /// Chunked stream.
    Stream(ByteStream),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Binary(bytes) => f.debug_tuple("Binary").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A successful (2xx) response.
#[derive(Debug)]
pub struct FetchResponse {
    /// Final URL after redirects; relative links on the page resolve against it.
    pub url: Url,
    /// Content-Type header value, when present.
    pub content_type: Option<String>,
    /// Response body.
    pub payload: Payload,
}

impl FetchResponse {
    /// Creates a response without a content type.
    #[must_use]
    pub fn new(url: Url, payload: Payload) -> Self {
        Self {
            url,
            content_type: None,
            payload,
        }
    }

    /// Returns the body as text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnexpectedPayload`] for streamed responses.
    pub fn into_text(self) -> Result<String, FetchError> {
        match self.payload {
            Payload::Text(text) => Ok(text),
            Payload::Binary(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Payload::Stream(_) => Err(FetchError::UnexpectedPayload {
                url: self.url.to_string(),
                expected: "text",
            }),
        }
    }

    /// Returns the body as a chunk stream regardless of delivery mode.
    #[must_use]
    pub fn into_stream(self) -> ByteStream {
        match self.payload {
            Payload::Stream(body) => body,
            Payload::Binary(bytes) => stream::iter(std::iter::once(Ok(bytes))).boxed(),
            Payload::Text(text) => stream::iter(std::iter::once(Ok(text.into_bytes()))).boxed(),
        }
    }
}

/// HTTP GET capability.
///
/// # Object Safety
///
/// Uses `async_trait` so the pipeline can hold an `Arc<dyn Fetcher>`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` with the given options.
    ///
    /// Non-2xx responses are errors; the returned response is always a success.
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse, FetchError>;
}

/// reqwest-backed [`Fetcher`].
///
/// Create once and reuse; the underlying client pools connections.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher presenting a browser User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] when the client cannot be constructed.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_user_agent(user_agent::default_page_user_agent())
    }

    /// Creates a fetcher with an explicit User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] when the client cannot be constructed.
    pub fn with_user_agent(user_agent: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent.into())
            .gzip(true)
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self, options), fields(url = %url, kind = ?options.response_kind))]
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut request = self.client.get(parsed).timeout(options.timeout);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_send_error(url, options, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success status");
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        if let (Some(limit), Some(length)) = (options.max_bytes, response.content_length())
            && length > limit
        {
            return Err(FetchError::too_large(url, limit));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let payload = match options.response_kind {
            ResponseKind::Text => {
                let body = read_body(response, url, options).await?;
                Payload::Text(String::from_utf8_lossy(&body).into_owned())
            }
            ResponseKind::Binary => Payload::Binary(read_body(response, url, options).await?),
            ResponseKind::Stream => Payload::Stream(limited_stream(response, url, options)),
        };

        debug!(final_url = %final_url, "fetch complete");
        Ok(FetchResponse {
            url: final_url,
            content_type,
            payload,
        })
    }
}

fn classify_send_error(url: &str, options: &FetchOptions, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url, options.timeout_ms())
    } else {
        FetchError::network(url, error)
    }
}

fn classify_body_error(url: &str, timeout_ms: u64, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url, timeout_ms)
    } else {
        FetchError::interrupted(url, error)
    }
}

async fn read_body(
    response: reqwest::Response,
    url: &str,
    options: &FetchOptions,
) -> Result<Vec<u8>, FetchError> {
    let timeout_ms = options.timeout_ms();
    let mut body_stream = response.bytes_stream();
    let mut body = Vec::new();

    while let Some(chunk) = body_stream.next().await {
        let chunk = chunk.map_err(|e| classify_body_error(url, timeout_ms, e))?;
        body.extend_from_slice(&chunk);
        if let Some(limit) = options.max_bytes
            && body.len() as u64 > limit
        {
            return Err(FetchError::too_large(url, limit));
        }
    }

    Ok(body)
}

fn limited_stream(response: reqwest::Response, url: &str, options: &FetchOptions) -> ByteStream {
    let url = url.to_string();
    let limit = options.max_bytes;
    let timeout_ms = options.timeout_ms();
    let mut received: u64 = 0;

    response
        .bytes_stream()
        .map(move |chunk| {
            let chunk = chunk.map_err(|e| classify_body_error(&url, timeout_ms, e))?;
            received += chunk.len() as u64;
            if let Some(limit) = limit
                && received > limit
            {
                return Err(FetchError::too_large(url.clone(), limit));
            }
            Ok(chunk.to_vec())
        })
        .boxed()
}
