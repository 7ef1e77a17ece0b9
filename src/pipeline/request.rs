//! Invocation request and response types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::CandidateList;
use crate::candidate::Candidate;

/// What to do when a search succeeds without a selection index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Return the candidate list and wait for an explicit index.
    #[default]
    Explicit,
    /// Download the first candidate.
    AutoFirst,
}

/// Parameters of one `search_and_download_book` invocation.
///
/// Numeric fields are signed so out-of-range values reach validation instead
/// of failing to deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookRequest {
    pub query: String,
    /// `epub`, `pdf`, ... or `any`; absent means `any`.
    pub format: Option<String>,
    pub category: Vec<String>,
    pub result_limit: Option<i64>,
    /// Absent: return the candidate list.
    pub selection_index: Option<i64>,
    pub auto_open: bool,
    /// Timeout for the asset download only.
    pub timeout_ms: Option<u64>,
    pub debug: bool,
    /// Overrides the pipeline's configured selection mode.
    pub selection_mode: Option<SelectionMode>,
}

impl BookRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_selection(mut self, index: i64) -> Self {
        self.selection_index = Some(index);
        self
    }
}

/// A book written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedBook {
    pub path: PathBuf,
    pub bytes: u64,
    /// True when the OS open was requested and launched.
    pub opened: bool,
    pub asset_url: String,
    pub candidate: Candidate,
}

/// Result of an invocation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Phase 1 only: candidates awaiting a selection.
    Candidates(CandidateList),
    /// Phase 2 completed.
    Saved(SavedBook),
}

/// Human-readable invocation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    pub message: String,
    /// Full error chain, only for failures with `debug` set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl ToolResponse {
    #[must_use]
    pub fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
            debug: None,
        }
    }
}
