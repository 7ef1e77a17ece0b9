//! Normalized candidate records and resolved assets.

use std::fmt;

use serde::Serialize;

/// Approximate size of a listed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeInfo {
    /// Label as shown by the source (`"1.2 Mb"`).
    pub label: String,
    /// Best-effort byte estimate.
    pub bytes: Option<u64>,
}

impl SizeInfo {
    /// Parses a size label such as `"1.2 Mb"`, `"523 kB"`, or `"12345"`.
    ///
    /// Units use 1024 multipliers; commas are treated as thousands separators.
    /// Returns `None` for blank labels.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        Some(Self {
            label: label.to_string(),
            bytes: estimate_bytes(label),
        })
    }

    /// Builds a size from an exact byte count.
    #[must_use]
    pub fn from_bytes(bytes: u64) -> Self {
        Self {
            label: human_size(bytes),
            bytes: Some(bytes),
        }
    }
}

impl fmt::Display for SizeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn estimate_bytes(label: &str) -> Option<u64> {
    let compact: String = label.chars().filter(|c| *c != ',').collect();
    let split = compact
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(compact.len());
    let (number, unit) = compact.split_at(split);
    let value: f64 = number.parse().ok()?;

    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" | "bytes" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        "g" | "gb" | "gib" => 1024 * 1024 * 1024,
        _ => return None,
    };
    Some((value * multiplier as f64).round() as u64)
}

#[allow(clippy::cast_precision_loss)]
fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    match bytes {
        b if b >= GB => format!("{:.1} Gb", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} Mb", b as f64 / MB as f64),
        b if b >= KB => format!("{} kB", b / KB),
        b => format!("{b} B"),
    }
}

/// One normalized search-result entry pending selection.
///
/// Created fresh per search and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Candidate {
    pub title: String,
    pub author: String,
    /// Content-derived identifier (lowercase hex digest); may be empty.
    pub content_id: String,
    pub year: Option<String>,
    pub language: Option<String>,
    pub size: Option<SizeInfo>,
    /// Lowercase file extension as listed by the source.
    pub extension: String,
    /// Absolute URL of the next resolution stage; may be empty.
    pub locator: String,
}

impl Candidate {
    /// A candidate can be selected only when it can be resolved further.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.content_id.trim().is_empty() || !self.locator.trim().is_empty()
    }

    /// Author, or a placeholder when the source listed none.
    #[must_use]
    pub fn display_author(&self) -> &str {
        if self.author.trim().is_empty() {
            "Unknown author"
        } else {
            &self.author
        }
    }
}

/// Final asset URL plus the metadata needed to fetch and name it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Absolute asset URL.
    pub url: String,
    /// Extension to use for the saved file.
    pub suggested_extension: String,
    /// The candidate this asset was resolved from, unchanged.
    pub source_candidate: Candidate,
    /// Pages visited on the way, in order.
    pub trail: Vec<String>,
}
