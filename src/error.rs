//! Pipeline-level error taxonomy.
//!
//! Every failure of an invocation ends up as one [`PipelineError`]. All of them
//! are terminal for the current invocation; retrying is the caller's call.
//! Messages follow the project's "what ... Suggestion: fix" layout.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::sink::SinkError;

/// Errors surfaced by the resolution pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rejected before any network call (empty query, bad format, bad index).
    #[error("invalid input: {message}\n  Suggestion: {suggestion}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
        /// How to fix it.
        suggestion: &'static str,
    },

    /// The search answered but nothing survived filtering.
    #[error("no results for '{query}' (format: {format})\n  Suggestion: try a different query or format")]
    NoResults {
        /// The query text.
        query: String,
        /// The requested format label.
        format: String,
    },

    /// DNS, connection, timeout, or broken-stream failure.
    #[error("upstream unavailable: {source}\n  Suggestion: the catalog or mirror may be down; try again later")]
    UpstreamUnavailable {
        /// The transport failure.
        #[source]
        source: FetchError,
    },

    /// Stage A found no link to a mirror page.
    #[error("no mirror link found on {page} for '{title}'\n  Suggestion: retry with --debug for diagnostics, or pick another candidate")]
    MirrorNotFound {
        /// The page that was searched.
        page: String,
        /// The candidate title.
        title: String,
    },

    /// Stage B found no link to the asset.
    #[error("no download link found on mirror page {page}\n  Suggestion: retry with --debug for diagnostics, or pick another candidate")]
    DownloadLinkNotFound {
        /// The mirror page that was searched.
        page: String,
    },

    /// Non-2xx response from any stage.
    #[error("HTTP {status} from {url}\n  Suggestion: the link may be stale; search again or pick another candidate")]
    HttpStatus {
        /// The offending URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The asset exceeded the configured byte ceiling.
    #[error("response from {url} exceeds the {limit} byte ceiling\n  Suggestion: raise `max_download_bytes` or pick a smaller file")]
    ResponseTooLarge {
        /// The asset URL.
        url: String,
        /// The ceiling in bytes.
        limit: u64,
    },

    /// Fetch failures that are neither transport nor status related.
    #[error("request failed: {source}")]
    Fetch {
        /// The fetch failure.
        #[source]
        source: FetchError,
    },

    /// The destination could not be written; any partial file was removed.
    #[error("could not save the download: {source}\n  Suggestion: check free space and permissions of the output directory")]
    Sink {
        /// The sink failure.
        #[source]
        source: SinkError,
    },
}

impl PipelineError {
    /// Creates an `InvalidInput` error with a generic suggestion.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            suggestion: "Check the request parameters and try again",
        }
    }

    /// Creates the `InvalidInput` error for a selection index outside the list.
    #[must_use]
    pub fn index_out_of_range(index: i64, len: usize) -> Self {
        let message = if len == 0 {
            format!("selection index {index} is out of range; there are no candidates to select")
        } else {
            format!(
                "selection index {index} is out of range; valid range is [0,{}]",
                len - 1
            )
        };
        Self::InvalidInput {
            message,
            suggestion: "Pick an index from the listed candidates",
        }
    }

    /// Creates a `NoResults` error.
    #[must_use]
    pub fn no_results(query: impl Into<String>, format: impl Into<String>) -> Self {
        Self::NoResults {
            query: query.into(),
            format: format.into(),
        }
    }

    /// Creates a `MirrorNotFound` error.
    #[must_use]
    pub fn mirror_not_found(page: impl Into<String>, title: impl Into<String>) -> Self {
        Self::MirrorNotFound {
            page: page.into(),
            title: title.into(),
        }
    }

    /// Creates a `DownloadLinkNotFound` error.
    #[must_use]
    pub fn download_link_not_found(page: impl Into<String>) -> Self {
        Self::DownloadLinkNotFound { page: page.into() }
    }
}

impl From<FetchError> for PipelineError {
    fn from(source: FetchError) -> Self {
        match source {
            FetchError::HttpStatus { url, status } => Self::HttpStatus { url, status },
            FetchError::ResponseTooLarge { url, limit } => Self::ResponseTooLarge { url, limit },
            other if other.is_transport() => Self::UpstreamUnavailable { source: other },
            other => Self::Fetch { source: other },
        }
    }
}

impl From<SinkError> for PipelineError {
    fn from(source: SinkError) -> Self {
        match source {
            // A broken body is a network failure even though the sink noticed it.
            SinkError::Stream { source, .. } => Self::from(source),
            other => Self::Sink { source: other },
        }
    }
}
