//! Human-readable rendering of pipeline outcomes.

use std::error::Error as _;
use std::fmt::Write as _;

use crate::candidate::Candidate;
use crate::error::PipelineError;
use crate::failure::describe_failure;
use crate::pipeline::{CandidateList, SavedBook};

/// Enumerated candidate list plus the follow-up instruction.
#[must_use]
pub fn render_candidates(list: &CandidateList) -> String {
    let mut out = String::new();
    let noun = if list.len() == 1 { "candidate" } else { "candidates" };
    let _ = writeln!(
        out,
        "Found {} {noun} for \"{}\" (format: {}, source: {}):",
        list.len(),
        list.query.text(),
        list.query.preferred_format(),
        list.source
    );
    out.push('\n');

    for (index, candidate) in list.candidates.iter().enumerate() {
        let _ = writeln!(
            out,
            "[{index}] {} by {}",
            candidate.title,
            candidate.display_author()
        );
        let details = detail_line(candidate);
        if !details.is_empty() {
            let _ = writeln!(out, "    {details}");
        }
    }

    out.push('\n');
    let last = list.len().saturating_sub(1);
    let _ = write!(
        out,
        "Repeat the request with a selection index between 0 and {last} to download one of these."
    );
    out
}

/// `2018 · English · 1.2 Mb · epub`, skipping unknown fields.
fn detail_line(candidate: &Candidate) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(year) = &candidate.year {
        parts.push(year.clone());
    }
    if let Some(language) = &candidate.language {
        parts.push(language.clone());
    }
    if let Some(size) = &candidate.size {
        parts.push(size.label.clone());
    }
    if !candidate.extension.is_empty() {
        parts.push(candidate.extension.clone());
    }
    parts.join(" · ")
}

/// Confirmation naming the saved path.
#[must_use]
pub fn render_saved(saved: &SavedBook) -> String {
    let mut out = format!(
        "Saved \"{}\" to {} ({} bytes).",
        saved.candidate.title,
        saved.path.display(),
        saved.bytes
    );
    if saved.opened {
        out.push_str("\nOpened with the default application.");
    }
    out
}

/// One descriptive failure message: descriptor headline, error, cause, and fix.
#[must_use]
pub fn render_failure(error: &PipelineError) -> String {
    let descriptor = describe_failure(error);
    format!(
        "{} {}: {}\n{error}\n  Why: {}\n  Fix: {}",
        descriptor.category.icon(),
        descriptor.category.label(),
        descriptor.what,
        descriptor.why,
        descriptor.fix
    )
}

/// Debug payload: the error's `Debug` form followed by its source chain.
#[must_use]
pub fn render_debug(error: &PipelineError) -> String {
    let mut out = format!("{error:?}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(out, "\nCaused by: {cause}");
        source = cause.source();
    }
    out
}
