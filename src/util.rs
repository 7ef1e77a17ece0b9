//! Shared helpers for the extractor and resolver: static regexes, URL joining, binary paths.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// 32-hex content digest as catalogs embed it in links.
pub(crate) static CONTENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)\b([0-9a-f]{32})\b"));

/// File extensions that mark a URL as the asset itself.
pub(crate) const BINARY_EXTENSIONS: &[&str] = &[
    ".pdf", ".epub", ".mobi", ".azw3", ".djvu", ".fb2", ".txt", ".doc", ".docx", ".rtf", ".zip",
    ".rar", ".7z", ".gz", ".cbz", ".cbr",
];

/// Resolves a possibly relative URL string against a base URL.
///
/// Returns the value as-is if it already starts with `http://` or `https://`;
/// normalizes `//...` to `https:...`; otherwise joins with `base_url`.
#[must_use]
pub(crate) fn absolutize_url(value: &str, base_url: &Url) -> Option<String> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    if value.starts_with("//") {
        return Some(format!("https:{value}"));
    }
    base_url.join(value).ok().map(|url| url.to_string())
}

/// Returns the first 32-hex digest in `value`, lowercased.
#[must_use]
pub(crate) fn find_content_id(value: &str) -> Option<String> {
    CONTENT_ID_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Lowercased path of `value`, parsed on its own or against a dummy base.
fn lowercase_path(value: &str) -> String {
    Url::parse(value)
        .or_else(|_| Url::parse("https://relative.invalid/").and_then(|base| base.join(value)))
        .map(|url| url.path().to_ascii_lowercase())
        .unwrap_or_else(|_| value.to_ascii_lowercase())
}

/// Returns the binary extension (without dot) the URL path ends in, if any.
#[must_use]
pub(crate) fn binary_extension(value: &str) -> Option<&'static str> {
    let path = lowercase_path(value);
    BINARY_EXTENSIONS
        .iter()
        .find(|ext| path.ends_with(*ext))
        .map(|ext| ext.trim_start_matches('.'))
}

/// Returns true if the URL path ends in a known binary extension.
#[must_use]
pub(crate) fn is_binary_url(value: &str) -> bool {
    binary_extension(value).is_some()
}

/// Percent-decoded file stem of the URL's last path segment.
///
/// `https://m.example/get/Atomic%20Habits.epub` yields `Atomic Habits`.
#[must_use]
pub(crate) fn url_file_stem(value: &str) -> Option<String> {
    let url = Url::parse(value).ok()?;
    let segment = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment).ok()?;
    let stem = match decoded.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains(' ') => stem,
        _ => decoded.as_ref(),
    };
    let stem = stem.trim();
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Collapses internal whitespace runs to single spaces.
#[must_use]
pub(crate) fn squash_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize_url_variants() {
        let base = Url::parse("https://libgen.is/search.php?req=x").unwrap();
        assert_eq!(
            absolutize_url("book/index.php?md5=ab", &base).as_deref(),
            Some("https://libgen.is/book/index.php?md5=ab")
        );
        assert_eq!(
            absolutize_url("//library.lol/main/ab", &base).as_deref(),
            Some("https://library.lol/main/ab")
        );
        assert_eq!(
            absolutize_url("http://x.org/a", &base).as_deref(),
            Some("http://x.org/a")
        );
    }

    #[test]
    fn test_find_content_id_lowercases() {
        assert_eq!(
            find_content_id("book/index.php?md5=0123456789ABCDEF0123456789ABCDEF").as_deref(),
            Some("0123456789abcdef0123456789abcdef")
        );
        assert_eq!(find_content_id("/fiction/deadbeef"), None);
    }

    #[test]
    fn test_binary_extension_ignores_query() {
        assert_eq!(
            binary_extension("https://download.example/main/1/x/Atomic.epub?key=1"),
            Some("epub")
        );
        assert_eq!(binary_extension("/get.php?md5=abc"), None);
        assert!(is_binary_url("files/book.PDF"));
    }

    #[test]
    fn test_url_file_stem_decodes_last_segment() {
        assert_eq!(
            url_file_stem("https://m.example/get/Atomic%20Habits.epub?key=1").as_deref(),
            Some("Atomic Habits")
        );
        assert_eq!(url_file_stem("https://m.example/get.php?md5=ab").as_deref(), Some("get"));
        assert_eq!(url_file_stem("https://m.example/"), None);
    }

    #[test]
    fn test_squash_whitespace() {
        assert_eq!(squash_whitespace("  Atomic \n  Habits "), "Atomic Habits");
    }
}
