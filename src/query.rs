//! Search query model and input validation.
//!
//! A [`SearchQuery`] is built once per invocation and never mutated; every
//! constructor validates so that an invalid request fails before any network
//! call is attempted.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Default number of candidates returned by a search.
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// Largest accepted result limit.
pub const MAX_RESULT_LIMIT: usize = 100;

/// Category tag that routes a search to the fiction catalog.
pub const FICTION_CATEGORY: &str = "fiction";

/// Concrete book file formats the catalogs list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BookFormat {
    Epub,
    Pdf,
    Mobi,
    Azw3,
    Djvu,
    Fb2,
    Txt,
}

impl BookFormat {
    /// All supported formats, in display order.
    pub const ALL: [Self; 7] = [
        Self::Epub,
        Self::Pdf,
        Self::Mobi,
        Self::Azw3,
        Self::Djvu,
        Self::Fb2,
        Self::Txt,
    ];

    /// Lowercase extension label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Epub => "epub",
            Self::Pdf => "pdf",
            Self::Mobi => "mobi",
            Self::Azw3 => "azw3",
            Self::Djvu => "djvu",
            Self::Fb2 => "fb2",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for BookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookFormat {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
            .ok_or_else(|| PipelineError::InvalidInput {
                message: format!("unknown format '{value}'"),
                suggestion: "Use one of: epub, pdf, mobi, azw3, djvu, fb2, txt, any",
            })
    }
}

/// Format filter applied to extracted candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatPreference {
    /// Keep every candidate.
    #[default]
    Any,
    /// Keep only candidates whose extension matches.
    Only(BookFormat),
}

impl FormatPreference {
    /// Returns true if a candidate with `extension` passes the filter.
    ///
    /// Matching is case-insensitive and accepts either an exact match or a
    /// substring (catalogs sometimes list `"epub (zip)"` or `"EPUB3"`).
    #[must_use]
    pub fn matches(self, extension: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(format) => extension
                .trim()
                .to_ascii_lowercase()
                .contains(format.as_str()),
        }
    }

    /// The concrete format, if any.
    #[must_use]
    pub fn format(self) -> Option<BookFormat> {
        match self {
            Self::Any => None,
            Self::Only(format) => Some(format),
        }
    }
}

impl fmt::Display for FormatPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Only(format) => f.write_str(format.as_str()),
        }
    }
}

impl FromStr for FormatPreference {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
            return Ok(Self::Any);
        }
        trimmed.parse().map(Self::Only)
    }
}

/// Immutable, validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    preferred_format: FormatPreference,
    categories: BTreeSet<String>,
    result_limit: usize,
}

impl SearchQuery {
    /// Creates a query with default format (`any`), no categories, and the default limit.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] when `text` is empty or whitespace.
    pub fn new(text: impl Into<String>) -> Result<Self, PipelineError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(PipelineError::InvalidInput {
                message: "query must not be empty".to_string(),
                suggestion: "Provide a book title, author, or ISBN",
            });
        }
        Ok(Self {
            text,
            preferred_format: FormatPreference::Any,
            categories: BTreeSet::new(),
            result_limit: DEFAULT_RESULT_LIMIT,
        })
    }

    /// Sets the format preference.
    #[must_use]
    pub fn with_format(mut self, preferred_format: FormatPreference) -> Self {
        self.preferred_format = preferred_format;
        self
    }

    /// Sets category tags; tags are trimmed, lowercased, and deduplicated.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.categories = categories
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_ascii_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        self
    }

    /// Sets the result limit.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] unless `1 <= limit <= MAX_RESULT_LIMIT`.
    pub fn with_result_limit(mut self, limit: i64) -> Result<Self, PipelineError> {
        let valid = usize::try_from(limit)
            .ok()
            .filter(|value| (1..=MAX_RESULT_LIMIT).contains(value));
        let Some(limit) = valid else {
            return Err(PipelineError::InvalidInput {
                message: format!("result limit {limit} is out of range; expected 1..={MAX_RESULT_LIMIT}"),
                suggestion: "Pass a positive result limit",
            });
        };
        self.result_limit = limit;
        Ok(self)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn preferred_format(&self) -> FormatPreference {
        self.preferred_format
    }

    #[must_use]
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    #[must_use]
    pub fn result_limit(&self) -> usize {
        self.result_limit
    }

    /// Returns true when the query targets the fiction catalog.
    #[must_use]
    pub fn is_fiction(&self) -> bool {
        self.categories.contains(FICTION_CATEGORY)
    }
}
