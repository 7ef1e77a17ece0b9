//! Ordered link-rule tables for the resolution stages.
//!
//! Each stage owns a table of named predicates ordered most specific first.
//! Evaluation walks the table rule by rule; for each rule the whole page is
//! scanned, and the first anchor it accepts wins. A rule that accepts nothing
//! has no opinion and the next one is tried.

use url::Url;

use super::anchors::Anchor;
use crate::util::{absolutize_url, is_binary_url};

/// Canonical label of a direct fetch link.
pub const FETCH_LABEL: &str = "GET";

/// Link text must be longer than this for the content-id rule.
pub const MIN_LABEL_LEN: usize = 3;

/// Target substrings of known mirror hosts and mirror paths.
pub const MIRROR_HOST_PATTERNS: &[&str] = &[
    "library.lol",
    "libgen.li",
    "libgen.lc",
    "libgen.rocks",
    "/main/",
    "ads.php",
    "get.php",
    "/fiction/",
];

/// Target substrings of catalog pages that never lead to a file.
pub const NON_MIRROR_PATTERNS: &[&str] = &[
    "bibtex",
    "librarian",
    "edit",
    "search.php",
    "book/index.php",
];

/// Target substrings that usually mark a download endpoint.
pub const DOWNLOAD_PATH_PATTERNS: &[&str] = &["/get", "get.php", "download", "/dl/"];

/// What a rule may look at besides the anchor.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub title: &'a str,
    pub content_id: &'a str,
    pub page_url: &'a Url,
}

/// Predicate over one anchor.
pub type LinkRule = fn(&Anchor, &StageContext<'_>) -> bool;

/// A rule plus the name reported in logs.
#[derive(Clone, Copy)]
pub struct NamedRule {
    pub name: &'static str,
    pub matches: LinkRule,
}

impl std::fmt::Debug for NamedRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedRule").field("name", &self.name).finish()
    }
}

/// Stage A: details page to mirror page.
pub const DETAILS_RULES: &[NamedRule] = &[
    NamedRule {
        name: "title-on-mirror-host",
        matches: title_on_mirror_host,
    },
    NamedRule {
        name: "content-id-link",
        matches: content_id_link,
    },
];

/// Stage B: mirror page to asset.
pub const MIRROR_RULES: &[NamedRule] = &[
    NamedRule {
        name: "fetch-label",
        matches: fetch_label,
    },
    NamedRule {
        name: "binary-or-download",
        matches: binary_or_download,
    },
];

/// Returns the first anchor accepted by the highest-priority rule that accepts any.
#[must_use]
pub fn first_match<'a>(
    rules: &[NamedRule],
    anchors: &'a [Anchor],
    context: &StageContext<'_>,
) -> Option<(&'static str, &'a Anchor)> {
    rules.iter().find_map(|rule| {
        anchors
            .iter()
            .find(|anchor| (rule.matches)(anchor, context))
            .map(|anchor| (rule.name, anchor))
    })
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_ascii_lowercase();
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Links back to the page itself or to catalog-only pages.
fn is_excluded(anchor: &Anchor, context: &StageContext<'_>) -> bool {
    if contains_any(&anchor.href, NON_MIRROR_PATTERNS) {
        return true;
    }
    absolutize_url(&anchor.href, context.page_url)
        .is_some_and(|target| target == context.page_url.as_str())
}

fn title_on_mirror_host(anchor: &Anchor, context: &StageContext<'_>) -> bool {
    let title = context.title.trim().to_lowercase();
    !title.is_empty()
        && !is_excluded(anchor, context)
        && anchor.text.to_lowercase().contains(&title)
        && contains_any(&anchor.href, MIRROR_HOST_PATTERNS)
}

fn content_id_link(anchor: &Anchor, context: &StageContext<'_>) -> bool {
    let content_id = context.content_id.trim().to_ascii_lowercase();
    if content_id.is_empty() || is_excluded(anchor, context) {
        return false;
    }
    let label = anchor.text.trim();
    anchor.href.to_ascii_lowercase().contains(&content_id)
        && (label.chars().count() > MIN_LABEL_LEN || label.eq_ignore_ascii_case(FETCH_LABEL))
}

fn fetch_label(anchor: &Anchor, _context: &StageContext<'_>) -> bool {
    anchor.text.trim().eq_ignore_ascii_case(FETCH_LABEL)
}

/// A file link or a download endpoint, whichever comes first on the page.
fn binary_or_download(anchor: &Anchor, context: &StageContext<'_>) -> bool {
    is_binary_url(&anchor.href)
        || (!is_excluded(anchor, context) && contains_any(&anchor.href, DOWNLOAD_PATH_PATTERNS))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MD5: &str = "0123456789abcdef0123456789abcdef";

    fn page() -> Url {
        Url::parse(&format!("https://catalog.example/book/index.php?md5={MD5}")).unwrap()
    }

    fn context(page_url: &Url) -> StageContext<'_> {
        StageContext {
            title: "Atomic Habits",
            content_id: MD5,
            page_url,
        }
    }

    #[test]
    fn test_title_rule_outranks_content_id_rule() {
        let page_url = page();
        let anchors = vec![
            Anchor::new(format!("https://mirror-a.example/{MD5}"), "Mirror A"),
            Anchor::new(format!("http://library.lol/main/{MD5}"), "Atomic Habits (library.lol)"),
        ];
        let (rule, anchor) = first_match(DETAILS_RULES, &anchors, &context(&page_url)).unwrap();
        assert_eq!(rule, "title-on-mirror-host");
        assert!(anchor.href.contains("library.lol"));
    }

    #[test]
    fn test_content_id_rule_needs_label_or_get() {
        let page_url = page();
        let short = vec![Anchor::new(format!("https://m.example/{MD5}"), "[1]")];
        assert!(first_match(DETAILS_RULES, &short, &context(&page_url)).is_none());

        let get = vec![Anchor::new(
            format!("https://m.example/{}", MD5.to_ascii_uppercase()),
            "get",
        )];
        let (rule, _) = first_match(DETAILS_RULES, &get, &context(&page_url)).unwrap();
        assert_eq!(rule, "content-id-link");
    }

    #[test]
    fn test_self_and_catalog_links_are_excluded() {
        let page_url = page();
        let anchors = vec![
            Anchor::new(format!("index.php?md5={MD5}"), "Atomic Habits details"),
            Anchor::new(format!("bibtex.php?md5={MD5}"), "BibTeX entry"),
            Anchor::new(format!("../librarian.php?md5={MD5}"), "Libgen Librarian"),
        ];
        assert!(first_match(DETAILS_RULES, &anchors, &context(&page_url)).is_none());
    }

    #[test]
    fn test_mirror_rules_priority() {
        let page_url = Url::parse("https://library.lol/main/x").unwrap();
        let anchors = vec![
            Anchor::new("https://cdn.example/download/123", "Cloudflare"),
            Anchor::new("https://cdn.example/files/Atomic.epub", "IPFS.io"),
            Anchor::new("https://cdn.example/main/123/Atomic%20Habits.epub", " get "),
        ];
        let (rule, anchor) = first_match(MIRROR_RULES, &anchors, &context(&page_url)).unwrap();
        assert_eq!(rule, "fetch-label");
        assert_eq!(anchor.text, " get ");

        let (rule, anchor) =
            first_match(MIRROR_RULES, &anchors[1..2], &context(&page_url)).unwrap();
        assert_eq!(rule, "binary-or-download");
        assert!(anchor.href.ends_with(".epub"));
    }

    #[test]
    fn test_download_link_before_file_link_wins() {
        let page_url = Url::parse("https://library.lol/main/x").unwrap();
        let anchors = vec![
            Anchor::new("https://cdn.example/download/123", "Cloudflare"),
            Anchor::new("https://cdn.example/files/Atomic.epub", "IPFS.io"),
        ];
        let (rule, anchor) = first_match(MIRROR_RULES, &anchors, &context(&page_url)).unwrap();
        assert_eq!(rule, "binary-or-download");
        assert_eq!(anchor.href, "https://cdn.example/download/123");
    }

    #[test]
    fn test_content_id_label_must_exceed_minimum() {
        let page_url = page();
        let three = vec![Anchor::new(format!("https://m.example/{MD5}"), "abc")];
        assert!(first_match(DETAILS_RULES, &three, &context(&page_url)).is_none());

        let four = vec![Anchor::new(format!("https://m.example/{MD5}"), "abcd")];
        assert!(first_match(DETAILS_RULES, &four, &context(&page_url)).is_some());
    }

    #[test]
    fn test_mirror_rules_no_match() {
        let page_url = Url::parse("https://library.lol/main/x").unwrap();
        let anchors = vec![Anchor::new("/about", "About us")];
        assert!(first_match(MIRROR_RULES, &anchors, &context(&page_url)).is_none());
    }
}
