// ABOUTME: Chooses the extraction strategy for a fetched body.
// ABOUTME: XML feed documents go to the feed mapper, everything else to the table mapper.

/// How a fetched body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    /// Sniff the body: feed-shaped XML roots use the feed mapper,
    /// everything else the table mapper. Sniffing is itself a heuristic,
    /// so callers that know their source can pin it.
    #[default]
    Auto,
    /// Force the RSS/Atom feed mapper.
    Feed,
    /// Force the board-table mapper.
    Board,
}

/// Returns true when the body opens like an XML feed document.
///
/// Only the first root element is inspected; validity is deliberately not
/// checked here. The feed mapper reports malformed documents itself, so a
/// body that opens with `<rss` but fails to parse is a parse error rather
/// than silently falling through to the table mapper.
pub fn looks_like_feed(body: &str) -> bool {
    let mut head = body.trim_start();

    // Skip the XML prolog and any doctype/comment noise before the root.
    loop {
        if let Some(rest) = head.strip_prefix("<?xml") {
            head = skip_past(rest, "?>");
        } else if head.starts_with("<!--") {
            head = skip_past(&head[4..], "-->");
        } else if head.starts_with("<!DOCTYPE") || head.starts_with("<!doctype") {
            head = skip_past(&head[9..], ">");
        } else {
            break;
        }
        head = head.trim_start();
    }

    const FEED_ROOTS: &[&str] = &["<rss", "<feed", "<rdf:RDF", "<RDF"];
    FEED_ROOTS.iter().any(|root| head.starts_with(root))
}

fn skip_past<'a>(s: &'a str, marker: &str) -> &'a str {
    match s.find(marker) {
        Some(idx) => &s[idx + marker.len()..],
        None => "",
    }
}
