// ABOUTME: Structured content extraction for school-site boards and feeds.
// ABOUTME: Fetches a page, locates the repeating structural unit, and maps it into normalized records.

pub mod client;
pub mod detail;
pub mod detect;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod record;
pub mod table;
pub mod time_norm;

pub use client::{Extractor, ExtractorBuilder, Options};
pub use detail::{extract_post_detail, PostDetail};
pub use detect::{looks_like_feed, SourceFormat};
pub use error::ExtractError;
pub use feed::extract_feed_records;
pub use fetch::{fetch, FetchResult, BROWSER_USER_AGENT, DEFAULT_TIMEOUT};
pub use record::{ExtractionMeta, ExtractionResult, NormalizedRecord};
pub use table::{extract_table_records, ColumnProfile};
pub use time_norm::normalize_date;

// ----------------------------------------------------------------------------
// URL utilities
// ----------------------------------------------------------------------------

use url::Url;

/// Extracts the base domain (scheme + host + optional port) from a URL.
pub fn base_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}

/// Derives a human-readable source label from a URL when the caller
/// supplies none. The `www.` prefix is dropped; unparseable URLs get a
/// fixed placeholder so the label is never empty.
pub fn source_label_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|h| h.strip_prefix("www.").unwrap_or(&h).to_string())
        .unwrap_or_else(|| "unknown_site".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_domain_keeps_port() {
        assert_eq!(
            base_domain("http://127.0.0.1:8080/board/list?id=1"),
            Some("http://127.0.0.1:8080".to_string())
        );
        assert_eq!(
            base_domain("https://school.example.kr/x"),
            Some("https://school.example.kr".to_string())
        );
        assert_eq!(base_domain("not a url"), None);
    }

    #[test]
    fn label_strips_www() {
        assert_eq!(
            source_label_from_url("https://www.school.example.kr/board"),
            "school.example.kr"
        );
        assert_eq!(source_label_from_url("nonsense"), "unknown_site");
    }
}
