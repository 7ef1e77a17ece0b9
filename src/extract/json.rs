//! Hit extraction for the hosted search API.
//!
//! The API answers either with a bare array of hits or with an object wrapping
//! the array. Field names vary between deployments, so every field is read
//! through a short alias list.

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::candidate::{Candidate, SizeInfo};
use crate::util::{
    absolutize_url, binary_extension, find_content_id, squash_whitespace, url_file_stem,
};

/// Keys that may hold the hit array inside a wrapper object.
const WRAPPER_KEYS: &[&str] = &["books", "results", "hits", "data"];

const TITLE_KEYS: &[&str] = &["title", "name"];
const AUTHOR_KEYS: &[&str] = &["author", "authors"];
const YEAR_KEYS: &[&str] = &["year"];
const LANGUAGE_KEYS: &[&str] = &["language", "lang"];
const SIZE_KEYS: &[&str] = &["size", "filesize"];
const EXTENSION_KEYS: &[&str] = &["extension", "ext", "format"];
const ID_KEYS: &[&str] = &["md5", "content_id", "hash"];
const LINK_KEYS: &[&str] = &["link", "url", "download_url", "mirror"];

/// Extracts candidates from an API response body.
///
/// A body that is not JSON, or JSON without a recognizable hit array, yields
/// no candidates.
#[must_use]
pub fn extract_hits(body: &str, base_url: &Url) -> Vec<Candidate> {
    let root: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "API body is not JSON");
            return Vec::new();
        }
    };

    hit_array(&root)
        .map(|hits| hits.iter().filter_map(|hit| parse_hit(hit, base_url)).collect())
        .unwrap_or_default()
}

fn hit_array(root: &Value) -> Option<&Vec<Value>> {
    match root {
        Value::Array(hits) => Some(hits),
        Value::Object(map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

fn parse_hit(hit: &Value, base_url: &Url) -> Option<Candidate> {
    let object = hit.as_object()?;
    let field = |keys: &[&str]| keys.iter().find_map(|key| object.get(*key));

    let link = field(LINK_KEYS)
        .and_then(scalar_text)
        .and_then(|href| absolutize_url(&href, base_url))
        .unwrap_or_default();
    // Untitled hits that link straight to a file are named after the file.
    let file_ext = binary_extension(&link);
    let title = field(TITLE_KEYS)
        .and_then(scalar_text)
        .or_else(|| file_ext.and_then(|_| url_file_stem(&link)))?;
    let author = field(AUTHOR_KEYS).map(joined_text).unwrap_or_default();
    let content_id = field(ID_KEYS)
        .and_then(scalar_text)
        .map(|id| id.to_ascii_lowercase())
        .or_else(|| find_content_id(&link))
        .unwrap_or_default();

    let size = field(SIZE_KEYS).and_then(|value| match value {
        Value::Number(n) => n.as_u64().map(SizeInfo::from_bytes),
        other => scalar_text(other).and_then(|label| SizeInfo::parse(&label)),
    });

    Some(Candidate {
        title,
        author,
        content_id,
        year: field(YEAR_KEYS).and_then(scalar_text),
        language: field(LANGUAGE_KEYS).and_then(scalar_text),
        size,
        extension: field(EXTENSION_KEYS)
            .and_then(scalar_text)
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .or_else(|| file_ext.map(str::to_string))
            .unwrap_or_default(),
        locator: link,
    })
}

/// Strings and numbers as trimmed text; everything else is absent.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => squash_whitespace(s),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// A string, or an array of strings joined with `", "`.
fn joined_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => scalar_text(other).unwrap_or_default(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://api.example/v1/").unwrap()
    }

    #[test]
    fn test_wrapped_hits_with_aliases() {
        let body = r#"{"books":[
            {"title":"Atomic Habits","authors":["James Clear"],"year":2018,"lang":"English",
             "filesize":1048576,"ext":"EPUB","md5":"0123456789ABCDEF0123456789ABCDEF",
             "link":"mirror/0123456789abcdef0123456789abcdef"}
        ]}"#;
        let hits = extract_hits(body, &base());
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.title, "Atomic Habits");
        assert_eq!(hit.author, "James Clear");
        assert_eq!(hit.year.as_deref(), Some("2018"));
        assert_eq!(hit.language.as_deref(), Some("English"));
        assert_eq!(hit.size.as_ref().unwrap().bytes, Some(1_048_576));
        assert_eq!(hit.extension, "epub");
        assert_eq!(hit.content_id, "0123456789abcdef0123456789abcdef");
        assert_eq!(
            hit.locator,
            "https://api.example/v1/mirror/0123456789abcdef0123456789abcdef"
        );
    }

    #[test]
    fn test_bare_array_and_bad_entries_skipped() {
        let body = r#"[
            {"name":"Dune","author":"Frank Herbert","format":"pdf","url":"https://m.example/dune.pdf"},
            {"author":"No Title"},
            "not an object",
            {"title":"   "}
        ]"#;
        let hits = extract_hits(body, &base());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Dune");
        assert_eq!(hits[0].content_id, "");
        assert_eq!(hits[0].locator, "https://m.example/dune.pdf");
    }

    #[test]
    fn test_untitled_file_link_named_after_file() {
        let body = r#"[{"author":"Frank Herbert","download_url":"https://m.example/get/Dune%20Messiah.epub"}]"#;
        let hits = extract_hits(body, &base());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Dune Messiah");
        assert_eq!(hits[0].extension, "epub");
    }

    #[test]
    fn test_non_json_and_unknown_wrapper_yield_nothing() {
        assert!(extract_hits("<html>", &base()).is_empty());
        assert!(extract_hits(r#"{"items":[{"title":"x"}]}"#, &base()).is_empty());
    }
}
