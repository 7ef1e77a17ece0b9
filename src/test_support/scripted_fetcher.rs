//! In-memory [`Fetcher`] that answers from a fixed URL table and records calls.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use url::Url;

use crate::fetch::{FetchError, FetchOptions, FetchResponse, Fetcher, Payload, ResponseKind};

/// Canned answer for one URL.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// 200 with an HTML/JSON body.
    Page(String),
    /// 200 with a binary body.
    Bytes(Vec<u8>),
    /// 200 whose stream yields these bytes and then breaks.
    BrokenStream(Vec<u8>),
    /// Non-2xx status.
    Status(u16),
    /// Connection failure.
    Unreachable,
}

/// Scripted fetcher; unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, url: &str, answer: Scripted) -> Self {
        self.routes.insert(url.to_string(), answer);
        self
    }

    #[must_use]
    pub fn page(self, url: &str, body: &str) -> Self {
        self.route(url, Scripted::Page(body.to_string()))
    }

    /// URLs fetched so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse, FetchError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(url.to_string());

        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        let answer = self
            .routes
            .get(url)
            .cloned()
            .unwrap_or(Scripted::Status(404));

        let bytes = match answer {
            Scripted::Status(status) => return Err(FetchError::http_status(url, status)),
            Scripted::Unreachable => return Err(FetchError::network(url, "connection refused")),
            Scripted::BrokenStream(head) => {
                let chunks = vec![
                    Ok(head),
                    Err(FetchError::interrupted(url, "connection reset by peer")),
                ];
                return Ok(FetchResponse::new(
                    parsed,
                    Payload::Stream(stream::iter(chunks).boxed()),
                ));
            }
            Scripted::Page(body) => body.into_bytes(),
            Scripted::Bytes(bytes) => bytes,
        };

        if let Some(limit) = options.max_bytes
            && bytes.len() as u64 > limit
        {
            return Err(FetchError::too_large(url, limit));
        }

        let payload = match options.response_kind {
            ResponseKind::Text => Payload::Text(String::from_utf8_lossy(&bytes).into_owned()),
            ResponseKind::Binary => Payload::Binary(bytes),
            ResponseKind::Stream => Payload::Stream(stream::iter(vec![Ok(bytes)]).boxed()),
        };
        Ok(FetchResponse::new(parsed, payload))
    }
}
