//! Error types for the fetch module.
//!
//! Network-layer failures (unreachable host, timeout, interrupted body) are
//! kept distinct from content-layer failures (non-2xx status, oversized body)
//! so the orchestrator can report them differently.

use thiserror::Error;

/// Boxed underlying cause for transport failures.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while fetching a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS resolution, connection refused, TLS handshake, and similar failures.
    #[error("network unreachable fetching {url}: {source}")]
    NetworkUnreachable {
        /// The URL that could not be reached.
        url: String,
        /// The underlying transport error.
        #[source]
        source: BoxedCause,
    },

    /// The per-call timeout elapsed before the response completed.
    #[error("timeout after {timeout_ms} ms fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// The timeout that was applied, in milliseconds.
        timeout_ms: u64,
    },

    /// The body stream broke after the response had started.
    #[error("response body from {url} was interrupted: {source}")]
    Interrupted {
        /// The URL whose body was interrupted.
        url: String,
        /// The underlying stream error.
        #[source]
        source: BoxedCause,
    },

    /// Non-2xx HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response exceeded the configured byte ceiling.
    #[error("response from {url} exceeds the {limit} byte ceiling")]
    ResponseTooLarge {
        /// The URL with the oversized response.
        url: String,
        /// The configured ceiling in bytes.
        limit: u64,
    },

    /// The URL is malformed or not absolute.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// A text payload was requested from a streamed response.
    #[error("expected a {expected} payload from {url}")]
    UnexpectedPayload {
        /// The URL of the response.
        url: String,
        /// The payload kind the caller asked for.
        expected: &'static str,
    },

    /// The HTTP client itself could not be constructed.
    #[error("HTTP client construction failed: {source}")]
    ClientBuild {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Creates a network-unreachable error.
    pub fn network(url: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self::NetworkUnreachable {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout_ms,
        }
    }

    /// Creates an interrupted-body error.
    pub fn interrupted(url: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self::Interrupted {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a byte-ceiling error.
    pub fn too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::ResponseTooLarge {
            url: url.into(),
            limit,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns true for failures of the network layer rather than the content.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnreachable { .. } | Self::Timeout { .. } | Self::Interrupted { .. }
        )
    }

    /// Returns the URL the error refers to, when there is one.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::NetworkUnreachable { url, .. }
            | Self::Timeout { url, .. }
            | Self::Interrupted { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::ResponseTooLarge { url, .. }
            | Self::InvalidUrl { url }
            | Self::UnexpectedPayload { url, .. } => Some(url),
            Self::ClientBuild { .. } => None,
        }
    }
}
