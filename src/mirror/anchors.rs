//! Anchor collection from fetched pages.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::util::squash_whitespace;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").unwrap_or_else(|e| panic!("invalid static selector 'a[href]': {e}"))
});

/// One link on a page, with whitespace-normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

impl Anchor {
    #[must_use]
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// Collects every followable anchor in document order.
///
/// Empty targets, fragment-only targets, and `javascript:` targets are skipped.
#[must_use]
pub fn collect_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            if href.is_empty()
                || href.starts_with('#')
                || href.to_ascii_lowercase().starts_with("javascript:")
            {
                return None;
            }
            Some(Anchor::new(
                href,
                squash_whitespace(&element.text().collect::<String>()),
            ))
        })
        .collect()
}
