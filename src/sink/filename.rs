//! Deterministic file naming for saved books.

/// Longest stem kept, in characters.
pub const MAX_STEM_CHARS: usize = 100;

/// Stem used when neither title nor author yields any characters.
const FALLBACK_STEM: &str = "book";

/// Extension used when the suggested one is unusable.
const FALLBACK_EXTENSION: &str = "bin";

/// First numeric suffix for duplicate names (`name_2.ext`).
pub const DUPLICATE_SUFFIX_START: usize = 2;

/// Replaces every run of non-alphanumeric characters with a single `_`.
pub(crate) fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            prev_sep = false;
        } else if !prev_sep {
            out.push('_');
            prev_sep = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Builds `Title_Author.ext` from candidate metadata.
///
/// The stem is capped at [`MAX_STEM_CHARS`] characters. The extension is the
/// first alphanumeric token of `extension`, or `bin` when there is none.
#[must_use]
pub fn build_book_filename(title: &str, author: &str, extension: &str) -> String {
    let parts: Vec<String> = [title, author]
        .iter()
        .map(|part| sanitize_filename_component(part))
        .filter(|part| !part.is_empty())
        .collect();

    let mut stem: String = parts.join("_").chars().take(MAX_STEM_CHARS).collect();
    stem = stem.trim_end_matches('_').to_string();
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }

    let extension = extension
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|token| !token.is_empty())
        .map_or_else(|| FALLBACK_EXTENSION.to_string(), str::to_ascii_lowercase);

    format!("{stem}.{extension}")
}

/// The `n`-th duplicate of `filename`: `stem_n.ext`.
#[must_use]
pub(crate) fn numbered_filename(filename: &str, n: usize) -> String {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => format!("{}_{n}{}", &filename[..pos], &filename[pos..]),
        _ => format!("{filename}_{n}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_book_filename_title_author_ext() {
        assert_eq!(
            build_book_filename("Atomic Habits: An Easy & Proven Way", "James Clear", "EPUB"),
            "Atomic_Habits_An_Easy_Proven_Way_James_Clear.epub"
        );
    }

    #[test]
    fn test_build_book_filename_strips_path_tricks() {
        let name = build_book_filename("../../etc/passwd", "", ".pdf");
        assert_eq!(name, "etc_passwd.pdf");
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_build_book_filename_caps_stem() {
        let title = "A".repeat(250);
        let name = build_book_filename(&title, "Author", "epub");
        assert_eq!(name.len(), MAX_STEM_CHARS + ".epub".len());
    }

    #[test]
    fn test_build_book_filename_fallbacks() {
        assert_eq!(build_book_filename("***", "", ""), "book.bin");
        assert_eq!(build_book_filename("Dune", "", "epub (zip)"), "Dune.epub");
    }

    #[test]
    fn test_build_book_filename_keeps_unicode_letters() {
        assert_eq!(
            build_book_filename("Война и мир", "Толстой", "fb2"),
            "Война_и_мир_Толстой.fb2"
        );
    }

    #[test]
    fn test_numbered_filename() {
        assert_eq!(numbered_filename("Dune.epub", 2), "Dune_2.epub");
        assert_eq!(numbered_filename("README", 3), "README_3");
    }
}
