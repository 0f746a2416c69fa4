// ABOUTME: Feed-side extraction: scans RSS/Atom XML for repeating item elements.
// ABOUTME: Distinguishes malformed XML from a well-formed document with no items.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::ExtractError;
use crate::record::NormalizedRecord;
use crate::time_norm::normalize_date;

/// One repeating unit as read off the wire, before normalization.
#[derive(Debug, Default, Clone)]
struct RawUnit {
    title: String,
    link: String,
    date: String,
}

/// Which repeating element a unit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitKind {
    /// RSS 2.0 `item`; RSS 1.0's namespaced `rss:item` lands here too
    /// because elements are matched on their local name.
    Item,
    /// Atom `entry`.
    Entry,
}

/// Text-carrying child element currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Published,
    Updated,
}

/// Extracts normalized records from an RSS/Atom document.
///
/// `item` units are preferred; `entry` units are used only when the
/// document contains no `item` at all. Malformed XML yields
/// `ExtractError::Parse`; a well-formed document with neither unit yields
/// `ExtractError::StructureNotFound` - the two are distinct failure kinds.
/// Fields missing from a unit default to empty strings rather than
/// dropping the record.
pub fn extract_feed_records(
    body: &str,
    max_records: Option<usize>,
) -> Result<Vec<NormalizedRecord>, ExtractError> {
    let (items, entries) = scan_units(body)?;

    let units = if !items.is_empty() {
        items
    } else if !entries.is_empty() {
        entries
    } else {
        return Err(ExtractError::structure("no feed items found"));
    };

    let cap = max_records.unwrap_or(usize::MAX);
    let records = units
        .into_iter()
        .take(cap)
        .enumerate()
        .map(|(idx, unit)| NormalizedRecord {
            sequence_number: (idx + 1).to_string(),
            title: unit.title,
            date: normalize_date(&unit.date),
            author: String::new(),
            source_url: unit.link,
            view_count: "0".to_string(),
            has_attachment: None,
        })
        .collect();

    Ok(records)
}

/// Streams the document once, bucketing `item` and `entry` units.
fn scan_units(body: &str) -> Result<(Vec<RawUnit>, Vec<RawUnit>), ExtractError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut items: Vec<RawUnit> = Vec::new();
    let mut entries: Vec<RawUnit> = Vec::new();

    let mut in_unit: Option<UnitKind> = None;
    let mut current = RawUnit::default();
    let mut current_field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local = local_name(e);
                match local.as_str() {
                    "item" if in_unit.is_none() => {
                        in_unit = Some(UnitKind::Item);
                        current = RawUnit::default();
                    }
                    "entry" if in_unit.is_none() => {
                        in_unit = Some(UnitKind::Entry);
                        current = RawUnit::default();
                    }
                    _ if in_unit.is_some() => {
                        current_field = unit_field(&local, e, &mut current);
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                // Atom links are usually self-closing: <link href="..."/>.
                if in_unit.is_some() && local_name(e) == "link" {
                    capture_link_attr(e, &mut current);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(field) = current_field {
                    let text = e.unescape().map(|s| s.into_owned()).unwrap_or_default();
                    store_field(field, text, &mut current);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(field) = current_field {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    store_field(field, text, &mut current);
                }
            }
            Ok(Event::End(ref e)) => {
                let local = local_name_end(e.name().as_ref());
                match local.as_str() {
                    "item" | "entry" if in_unit.is_some() => {
                        match in_unit.take() {
                            Some(UnitKind::Item) => items.push(std::mem::take(&mut current)),
                            Some(UnitKind::Entry) => entries.push(std::mem::take(&mut current)),
                            None => {}
                        }
                        current_field = None;
                    }
                    _ => {
                        current_field = None;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ExtractError::parse(e)),
        }
    }

    Ok((items, entries))
}

/// Maps a child element inside a unit to the field its text should fill.
fn unit_field(local: &str, e: &BytesStart, current: &mut RawUnit) -> Option<Field> {
    match local {
        "title" => Some(Field::Title),
        "link" => {
            // An Atom link carries its target as an attribute even on a
            // non-empty element; prefer that over any element text.
            if capture_link_attr(e, current) {
                None
            } else {
                Some(Field::Link)
            }
        }
        "pubDate" | "published" | "date" => Some(Field::Published),
        "updated" => Some(Field::Updated),
        _ => None,
    }
}

fn store_field(field: Field, text: String, current: &mut RawUnit) {
    if text.is_empty() {
        return;
    }
    match field {
        Field::Title => {
            if current.title.is_empty() {
                current.title = text;
            }
        }
        Field::Link => {
            if current.link.is_empty() {
                current.link = text;
            }
        }
        // `published`/`pubDate` wins over `updated` regardless of the
        // order the elements appear in.
        Field::Published => {
            current.date = text;
        }
        Field::Updated => {
            if current.date.is_empty() {
                current.date = text;
            }
        }
    }
}

/// Pulls `href` off an Atom-style link. Returns true when the element
/// carried an href attribute, whether or not it was kept; such elements
/// have no text worth reading. Only the first `rel="alternate"` (or
/// rel-less) link is kept - enclosure and self links are skipped.
fn capture_link_attr(e: &BytesStart, current: &mut RawUnit) -> bool {
    let href = match get_attribute(e, "href") {
        Some(href) => href,
        None => return false,
    };
    let rel = get_attribute(e, "rel");
    if matches!(rel.as_deref(), None | Some("alternate")) && current.link.is_empty() {
        current.link = href;
    }
    true
}

fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| String::from_utf8(a.value.to_vec()).ok())
}

fn local_name(e: &BytesStart) -> String {
    local_name_end(e.name().as_ref())
}

fn local_name_end(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    name.split(':').last().unwrap_or(&name).to_string()
}
