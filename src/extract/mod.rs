//! Candidate extraction from search answers.
//!
//! Each upstream layout is a versioned [`SourceShape`]; supporting a new
//! layout means adding a variant and its parser, not branching inside an
//! existing one. Extraction is best-effort: entries missing identity fields
//! are dropped, everything else is kept in source order.

pub mod json;
pub mod table;

use std::fmt;

use tracing::debug;
use url::Url;

use crate::candidate::Candidate;
use crate::query::SearchQuery;

/// Layout of a search answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceShape {
    /// Non-fiction index results table.
    IndexTableV1,
    /// Fiction catalog results table.
    FictionTableV1,
    /// Hosted API JSON hits.
    JsonHitsV1,
}

impl SourceShape {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IndexTableV1 => "index-table-v1",
            Self::FictionTableV1 => "fiction-table-v1",
            Self::JsonHitsV1 => "json-hits-v1",
        }
    }
}

impl fmt::Display for SourceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts the ordered candidate list from a search answer.
///
/// Unselectable or untitled entries are skipped, the query's format filter is
/// applied, and the result is truncated to the query's limit. An empty result
/// is not an error here; the pipeline decides what "no results" means.
///
/// Deterministic: the same payload always yields the same sequence.
#[must_use]
pub fn extract_candidates(
    payload: &str,
    shape: SourceShape,
    base_url: &Url,
    query: &SearchQuery,
) -> Vec<Candidate> {
    let raw = match shape {
        SourceShape::IndexTableV1 => table::extract_index_rows(payload, base_url),
        SourceShape::FictionTableV1 => table::extract_fiction_rows(payload, base_url),
        SourceShape::JsonHitsV1 => json::extract_hits(payload, base_url),
    };
    let raw_count = raw.len();

    let preference = query.preferred_format();
    let candidates: Vec<Candidate> = raw
        .into_iter()
        .filter(|candidate| !candidate.title.trim().is_empty() && candidate.is_selectable())
        .filter(|candidate| preference.matches(&candidate.extension))
        .take(query.result_limit())
        .collect();

    debug!(
        shape = %shape,
        raw = raw_count,
        kept = candidates.len(),
        format = %preference,
        "candidates extracted"
    );
    candidates
}
