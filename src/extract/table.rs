//! Results-table extraction for the scraped catalog layouts.
//!
//! Rows that do not look like a book entry (header rows, ads, rows with too
//! few cells, rows without a title link) are skipped one by one;
//! a broken row never aborts the table.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::candidate::{Candidate, SizeInfo};
use crate::util::{absolutize_url, find_content_id, squash_whitespace};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid static selector '{css}': {e}"))
}

static INDEX_ROW: LazyLock<Selector> = LazyLock::new(|| selector("table.c tr"));
static FICTION_ROW: LazyLock<Selector> = LazyLock::new(|| selector("table.catalog tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));

/// Cells per row in the non-fiction index (mirror columns may follow).
const INDEX_MIN_CELLS: usize = 9;

/// Cells per row in the fiction catalog.
const FICTION_MIN_CELLS: usize = 5;

/// Non-fiction index columns.
mod index_col {
    pub const AUTHOR: usize = 1;
    pub const TITLE: usize = 2;
    pub const YEAR: usize = 4;
    pub const LANGUAGE: usize = 6;
    pub const SIZE: usize = 7;
    pub const EXTENSION: usize = 8;
}

/// Fiction catalog columns.
mod fiction_col {
    pub const AUTHOR: usize = 0;
    pub const SERIES: usize = 1;
    pub const TITLE: usize = 2;
    pub const LANGUAGE: usize = 3;
    pub const FILE: usize = 4;
}

/// Extracts candidates from the non-fiction search results table.
///
/// The content id comes from the `md5=` parameter of the title link, which
/// also serves as the locator (the book's details page).
#[must_use]
pub fn extract_index_rows(html: &str, base_url: &Url) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    document
        .select(&INDEX_ROW)
        .filter_map(|row| parse_index_row(row, base_url))
        .collect()
}

fn parse_index_row(row: ElementRef<'_>, base_url: &Url) -> Option<Candidate> {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
    if cells.len() < INDEX_MIN_CELLS {
        return None;
    }

    let (title_link, content_id) = title_link(cells[index_col::TITLE])?;
    let title = anchor_title(title_link);
    let href = title_link.value().attr("href")?;

    Some(Candidate {
        title,
        author: cell_text(cells[index_col::AUTHOR]),
        content_id,
        year: non_empty(cell_text(cells[index_col::YEAR])),
        language: non_empty(cell_text(cells[index_col::LANGUAGE])),
        size: SizeInfo::parse(&cell_text(cells[index_col::SIZE])),
        extension: cell_text(cells[index_col::EXTENSION]).to_ascii_lowercase(),
        locator: absolutize_url(href, base_url).unwrap_or_default(),
    })
}

/// Extracts candidates from the fiction catalog table.
///
/// The content id is the hex path segment of the title link; the File column
/// reads `"EPUB / 1.2 Mb"`.
#[must_use]
pub fn extract_fiction_rows(html: &str, base_url: &Url) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    document
        .select(&FICTION_ROW)
        .filter_map(|row| parse_fiction_row(row, base_url))
        .collect()
}

fn parse_fiction_row(row: ElementRef<'_>, base_url: &Url) -> Option<Candidate> {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
    if cells.len() < FICTION_MIN_CELLS {
        return None;
    }

    let (title_link, content_id) = title_link(cells[fiction_col::TITLE])?;
    let href = title_link.value().attr("href")?;

    let authors: Vec<String> = cells[fiction_col::AUTHOR]
        .select(&LIST_ITEM)
        .map(|item| squash_whitespace(&item.text().collect::<String>()))
        .filter(|name| !name.is_empty())
        .collect();
    let author = if authors.is_empty() {
        cell_text(cells[fiction_col::AUTHOR])
    } else {
        authors.join(", ")
    };

    let mut title = anchor_title(title_link);
    let series = cell_text(cells[fiction_col::SERIES]);
    if title.is_empty() && !series.is_empty() {
        title = series;
    }

    let (extension, size) = split_file_column(&cell_text(cells[fiction_col::FILE]));

    Some(Candidate {
        title,
        author,
        content_id,
        year: None,
        language: non_empty(cell_text(cells[fiction_col::LANGUAGE])),
        size,
        extension,
        locator: absolutize_url(href, base_url).unwrap_or_default(),
    })
}

/// `"EPUB / 1.2 Mb"` → `("epub", 1.2 Mb)`.
fn split_file_column(value: &str) -> (String, Option<SizeInfo>) {
    match value.split_once('/') {
        Some((ext, size)) => (ext.trim().to_ascii_lowercase(), SizeInfo::parse(size)),
        None => (value.trim().to_ascii_lowercase(), None),
    }
}

/// Title link of `cell` with its content id.
///
/// Prefers the first anchor whose target carries a content id; otherwise the
/// first anchor is still a usable locator and the content id stays empty.
fn title_link(cell: ElementRef<'_>) -> Option<(ElementRef<'_>, String)> {
    let identified = cell.select(&ANCHOR).find_map(|anchor| {
        let href = anchor.value().attr("href")?;
        find_content_id(href).map(|id| (anchor, id))
    });
    identified.or_else(|| {
        cell.select(&ANCHOR)
            .find(|anchor| anchor.value().attr("href").is_some_and(|h| !h.trim().is_empty()))
            .map(|anchor| (anchor, String::new()))
    })
}

/// Title from the anchor's own text nodes, leaving out nested ISBN/edition markup.
fn anchor_title(anchor: ElementRef<'_>) -> String {
    let own: String = anchor
        .children()
        .filter_map(|node| node.value().as_text().map(|text| String::from(&**text)))
        .collect();
    let own = squash_whitespace(&own);
    if own.is_empty() {
        squash_whitespace(&anchor.text().collect::<String>())
    } else {
        own
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    squash_whitespace(&cell.text().collect::<String>())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
