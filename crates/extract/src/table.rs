// ABOUTME: Board-side extraction: locates the content table and maps rows to records.
// ABOUTME: Carries the most-rows fallback and the script-href view-URL guess, both best-effort.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ExtractError;
use crate::record::NormalizedRecord;
use crate::time_norm::normalize_date;

/// Board-list selectors tried in priority order before any guessing.
/// These cover the class/id conventions of the common school CMSes.
const TABLE_SELECTORS: &[&str] = &[
    "table.boardList",
    "table.board_list",
    "table.list",
    "table.notice",
    ".board_list table",
    ".notice_list table",
    ".board_body table",
    "#board_list table",
    ".board-list table",
    "table.tbl_list",
];

/// Positional column mapping applied to a detected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnProfile {
    /// Pick per row from the cell count: >=6 cells rich, 3-5 minimal.
    /// Sites disagree on their column layout, so callers that know
    /// theirs can pin a profile instead.
    #[default]
    Auto,
    /// number, title(+link), attachment, author, date, view count.
    Rich,
    /// number, title(+link), then date/view count off the row tail.
    Minimal,
}

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static TH: Lazy<Selector> = Lazy::new(|| Selector::parse("th").unwrap());
static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static TBODY_TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody > tr").unwrap());
static ANY_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());

/// First embedded number in a script-pseudo href, e.g.
/// `javascript:fnView('11101','123')` or `javascript:goView(123)`.
static SCRIPT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"['(](\d+)[')]").unwrap());

/// Extracts normalized records from a board-style listing page.
///
/// The content table is located by the selector cascade, then by the
/// most-rows fallback. A page without any table is a structural error; a
/// table whose rows all fail mapping yields an empty (but successful)
/// record list, since decorative rows are expected.
pub fn extract_table_records(
    body: &str,
    page_url: &str,
    profile: ColumnProfile,
    max_records: Option<usize>,
) -> Result<Vec<NormalizedRecord>, ExtractError> {
    let doc = Html::parse_document(body);

    let table = locate_content_table(&doc)
        .ok_or_else(|| ExtractError::structure("no content table located"))?;

    let rows = collect_rows(&table);
    if rows.is_empty() {
        return Err(ExtractError::structure("content table has no rows"));
    }

    let cap = max_records.unwrap_or(usize::MAX);
    let mut records = Vec::new();
    for row in rows {
        if records.len() >= cap {
            break;
        }
        let cells: Vec<ElementRef> = row.select(&TD).collect();
        if cells.len() < 3 {
            // Decorative/separator rows are routine, not an error.
            continue;
        }
        match map_row(&cells, page_url, profile, records.len() + 1) {
            Ok(record) => records.push(record),
            Err(reason) => {
                // One bad row never aborts the batch.
                tracing::warn!(%reason, "skipping unmappable row");
            }
        }
    }

    Ok(records)
}

/// Finds the table most likely to hold the posting list.
///
/// The selector cascade wins when it matches. Otherwise every `<table>` is
/// scanned and the one with the most rows is picked, ties broken by
/// document order - a best-effort policy that can lose to an oversized
/// layout table.
fn locate_content_table(doc: &Html) -> Option<ElementRef<'_>> {
    for raw in TABLE_SELECTORS {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(table) = doc.select(&selector).next() {
                return Some(table);
            }
        }
    }

    let mut best: Option<ElementRef> = None;
    let mut max_rows = 0;
    for table in doc.select(&ANY_TABLE) {
        let rows = table.select(&TR).count();
        if rows > max_rows {
            max_rows = rows;
            best = Some(table);
        }
    }
    best
}

/// Collects candidate data rows, preferring `tbody` children and dropping
/// `.notice`-classed pinned rows unless that would drop everything.
fn collect_rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut rows: Vec<ElementRef> = table.select(&TBODY_TR).collect();
    if rows.is_empty() {
        rows = table.select(&TR).collect();
    }

    // Header rows never carry data.
    rows.retain(|row| row.select(&TH).next().is_none());

    let regular: Vec<ElementRef> = rows
        .iter()
        .copied()
        .filter(|row| !is_notice_row(row))
        .collect();
    if regular.is_empty() {
        rows
    } else {
        regular
    }
}

fn is_notice_row(row: &ElementRef) -> bool {
    row.value()
        .attr("class")
        .map_or(false, |classes| {
            classes.split_whitespace().any(|c| c == "notice")
        })
}

/// Maps one row's cells positionally. `seq` is the extractor-assigned
/// 1-based position; the board's own number cell is not trusted since
/// pinned posts reuse labels like "공지".
fn map_row(
    cells: &[ElementRef],
    page_url: &str,
    profile: ColumnProfile,
    seq: usize,
) -> Result<NormalizedRecord, String> {
    let effective = match profile {
        ColumnProfile::Auto => {
            if cells.len() >= 6 {
                ColumnProfile::Rich
            } else {
                ColumnProfile::Minimal
            }
        }
        pinned => pinned,
    };

    let (title, source_url) = title_and_link(&cells[1], page_url);

    let record = match effective {
        ColumnProfile::Rich => {
            if cells.len() < 6 {
                return Err(format!(
                    "rich profile needs 6 cells, row has {}",
                    cells.len()
                ));
            }
            NormalizedRecord {
                sequence_number: seq.to_string(),
                title,
                date: normalize_date(&element_text(&cells[4])),
                author: element_text(&cells[3]),
                source_url,
                view_count: element_text(&cells[5]),
                has_attachment: Some(has_attachment_marker(&cells[2])),
            }
        }
        ColumnProfile::Minimal | ColumnProfile::Auto => {
            let (date_cell, view_count) = if cells.len() >= 4 {
                (cells[cells.len() - 2], element_text(&cells[cells.len() - 1]))
            } else {
                (cells[cells.len() - 1], "0".to_string())
            };
            NormalizedRecord {
                sequence_number: seq.to_string(),
                title,
                date: normalize_date(&element_text(&date_cell)),
                author: String::new(),
                source_url,
                view_count,
                has_attachment: None,
            }
        }
    };

    Ok(record)
}

/// Reads the title cell: anchor text plus resolved href when a link is
/// present, plain cell text otherwise.
fn title_and_link(cell: &ElementRef, page_url: &str) -> (String, String) {
    match cell.select(&ANCHOR).next() {
        Some(anchor) => {
            let title = element_text(&anchor);
            let url = anchor
                .value()
                .attr("href")
                .map(|href| resolve_row_link(href, page_url))
                .unwrap_or_default();
            (title, url)
        }
        None => (element_text(cell), String::new()),
    }
}

/// Attachment columns hold an icon image or a marker link; bare
/// whitespace means no attachment.
fn has_attachment_marker(cell: &ElementRef) -> bool {
    static IMG_OR_A: Lazy<Selector> = Lazy::new(|| Selector::parse("img, a").unwrap());
    cell.select(&IMG_OR_A).next().is_some() || !element_text(cell).is_empty()
}

/// Resolves a row href into an absolute URL.
///
/// Script-pseudo hrefs hide the post id inside a function call; the first
/// embedded number is pulled out and a conventional `/board/view?id=`
/// URL is synthesized from the page's domain. This is a documented guess:
/// sites whose view path differs get a well-formed but wrong URL.
pub(crate) fn resolve_row_link(href: &str, page_url: &str) -> String {
    let href = href.trim();

    if href.to_ascii_lowercase().starts_with("javascript:") {
        if let Some(caps) = SCRIPT_ID_RE.captures(href) {
            if let Some(domain) = crate::base_domain(page_url) {
                return format!("{}/board/view?id={}", domain, &caps[1]);
            }
        }
        return String::new();
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    match Url::parse(page_url).and_then(|base| base.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Whitespace-collapsed text content of an element subtree.
pub(crate) fn element_text(el: &ElementRef) -> String {
    let joined = el.text().collect::<String>();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
