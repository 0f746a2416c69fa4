// ABOUTME: The Extractor entry point wiring fetch, format detection, and the two mappers.
// ABOUTME: Every public call returns a well-formed ExtractionResult; failures degrade, never raise.

use std::time::Duration;

use crate::detail::PostDetail;
use crate::detect::{looks_like_feed, SourceFormat};
use crate::error::ExtractError;
use crate::fetch::{build_client, fetch, BROWSER_USER_AGENT, DEFAULT_TIMEOUT};
use crate::record::{ExtractionResult, NormalizedRecord};
use crate::table::ColumnProfile;
use crate::{detail, feed, source_label_from_url, table};

/// Configuration for an [`Extractor`].
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub format: SourceFormat,
    pub profile: ColumnProfile,
    /// Truncates output to the first N records when set.
    pub max_records: Option<usize>,
    /// Pause between successive detail-page fetches. Fixed and
    /// non-adaptive; it only keeps the source server comfortable.
    pub detail_delay: Duration,
    pub http_client: Option<reqwest::Client>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: BROWSER_USER_AGENT.to_string(),
            format: SourceFormat::Auto,
            profile: ColumnProfile::Auto,
            max_records: None,
            detail_delay: Duration::from_secs(1),
            http_client: None,
        }
    }
}

/// Builder for constructing [`Extractor`] instances.
#[derive(Debug, Clone, Default)]
pub struct ExtractorBuilder {
    opts: Options,
}

impl ExtractorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request socket timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Pin the extraction strategy instead of sniffing the body.
    pub fn format(mut self, format: SourceFormat) -> Self {
        self.opts.format = format;
        self
    }

    /// Pin the column profile instead of deciding per row.
    pub fn profile(mut self, profile: ColumnProfile) -> Self {
        self.opts.profile = profile;
        self
    }

    /// Cap the number of records returned per extraction.
    pub fn max_records(mut self, max: usize) -> Self {
        self.opts.max_records = Some(max);
        self
    }

    /// Set the pause between detail-page fetches.
    pub fn detail_delay(mut self, delay: Duration) -> Self {
        self.opts.detail_delay = delay;
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    pub fn build(self) -> Extractor {
        Extractor::new(self.opts)
    }
}

/// Extracts normalized records from board pages and feeds.
///
/// One instance holds one HTTP client; extraction calls share nothing
/// else and each produces a fresh, immutable result.
pub struct Extractor {
    opts: Options,
    http_client: reqwest::Client,
}

impl Extractor {
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::new()
    }

    pub fn new(opts: Options) -> Self {
        let http_client = opts
            .http_client
            .clone()
            .unwrap_or_else(|| build_client(&opts.user_agent, opts.timeout));
        Self { opts, http_client }
    }

    /// Fetches `url` and extracts records.
    ///
    /// Never returns an error: fetch, parse, and structure failures all
    /// degrade into an empty record list with `meta.error` set. The label
    /// defaults to the URL's host when the caller supplies none, and
    /// `max_records` falls back to the configured default.
    pub async fn extract(
        &self,
        url: &str,
        label: Option<&str>,
        max_records: Option<usize>,
    ) -> ExtractionResult {
        let label = label
            .map(str::to_string)
            .unwrap_or_else(|| source_label_from_url(url));
        tracing::info!(source = %label, url, "starting extraction");

        let fetched = match fetch(&self.http_client, url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::error!(url, error = %e, "fetch failed");
                return ExtractionResult::failure(label, url, e.to_string());
            }
        };

        let body = fetched.text();
        // Links resolve against the post-redirect URL, but the result's
        // meta keeps the URL the caller asked for.
        self.finish(&body, &fetched.final_url, url, label, max_records)
    }

    /// Extracts records from markup fetched elsewhere.
    pub fn extract_html(
        &self,
        body: &str,
        url: &str,
        label: Option<&str>,
        max_records: Option<usize>,
    ) -> ExtractionResult {
        let label = label
            .map(str::to_string)
            .unwrap_or_else(|| source_label_from_url(url));
        self.finish(body, url, url, label, max_records)
    }

    fn finish(
        &self,
        body: &str,
        base_url: &str,
        source_url: &str,
        label: String,
        max_records: Option<usize>,
    ) -> ExtractionResult {
        match self.extract_records(body, base_url, max_records) {
            Ok(records) => {
                tracing::info!(source = %label, count = records.len(), "extraction finished");
                ExtractionResult::from_records(records, label, source_url)
            }
            Err(e) => {
                tracing::error!(source = %label, url = source_url, error = %e, "extraction failed");
                ExtractionResult::failure(label, source_url, e.to_string())
            }
        }
    }

    fn extract_records(
        &self,
        body: &str,
        base_url: &str,
        max_records: Option<usize>,
    ) -> Result<Vec<NormalizedRecord>, ExtractError> {
        let cap = max_records.or(self.opts.max_records);

        let use_feed = match self.opts.format {
            SourceFormat::Feed => true,
            SourceFormat::Board => false,
            SourceFormat::Auto => looks_like_feed(body),
        };

        if use_feed {
            feed::extract_feed_records(body, cap)
        } else {
            table::extract_table_records(body, base_url, self.opts.profile, cap)
        }
    }

    /// Fetches each record's detail page in source order, pausing between
    /// requests.
    ///
    /// A record without a URL, or whose fetch fails, yields an empty
    /// [`PostDetail`] and processing continues; there are no retries. The
    /// returned list is index-aligned with `result.records`.
    pub async fn fetch_details(&self, result: &ExtractionResult) -> Vec<PostDetail> {
        let mut details = Vec::with_capacity(result.records.len());

        for (idx, record) in result.records.iter().enumerate() {
            if idx > 0 && !self.opts.detail_delay.is_zero() {
                tokio::time::sleep(self.opts.detail_delay).await;
            }

            if record.source_url.is_empty() {
                details.push(PostDetail::default());
                continue;
            }

            match fetch(&self.http_client, &record.source_url).await {
                Ok(fetched) => {
                    let body = fetched.text();
                    details.push(detail::extract_post_detail(&body, &fetched.final_url));
                }
                Err(e) => {
                    tracing::warn!(url = %record.source_url, error = %e, "detail fetch failed");
                    details.push(PostDetail::default());
                }
            }
        }

        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <item>
    <title>공지</title>
    <link>https://example.kr/view?id=1</link>
    <pubDate>Wed, 02 Jul 2025 23:17:42 GMT</pubDate>
  </item>
</channel></rss>"#;

    #[tokio::test]
    async fn extract_feed_over_http() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/feed.xml");
            then.status(200)
                .header("content-type", "application/xml; charset=utf-8")
                .body(RSS);
        });

        let extractor = Extractor::builder().build();
        let result = extractor
            .extract(&server.url("/feed.xml"), Some("테스트학교"), None)
            .await;
        mock.assert();

        assert!(!result.is_degraded());
        assert_eq!(result.meta.source_label, "테스트학교");
        assert_eq!(result.meta.total_count, 1);
        assert_eq!(result.records[0].title, "공지");
        assert_eq!(result.records[0].date, "2025-07-02");
    }

    #[tokio::test]
    async fn http_error_degrades_instead_of_raising() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/board");
            then.status(500).body("internal error");
        });

        let extractor = Extractor::builder().build();
        let result = extractor.extract(&server.url("/board"), None, None).await;

        assert!(result.records.is_empty());
        assert_eq!(result.meta.total_count, 0);
        let error = result.meta.error.expect("error must be set");
        assert!(error.contains("500"), "got: {}", error);
    }

    #[tokio::test]
    async fn timeout_degrades_instead_of_raising() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500)).body("late");
        });

        let extractor = Extractor::builder()
            .timeout(Duration::from_millis(50))
            .build();
        let result = extractor.extract(&server.url("/slow"), None, None).await;

        assert!(result.records.is_empty());
        assert!(result.meta.error.is_some());
    }

    #[tokio::test]
    async fn unreachable_host_degrades() {
        let extractor = Extractor::builder()
            .timeout(Duration::from_millis(200))
            .build();
        // Nothing listens on this port.
        let result = extractor
            .extract("http://127.0.0.1:9/board", Some("닫힌 서버"), None)
            .await;

        assert!(result.records.is_empty());
        assert!(result.meta.error.is_some());
        assert_eq!(result.meta.source_label, "닫힌 서버");
    }

    #[test]
    fn garbage_xml_with_pinned_feed_format_is_parse_failure() {
        let extractor = Extractor::builder().format(SourceFormat::Feed).build();
        let result = extractor.extract_html(
            "<rss><channel><item><title>x</title></oops></channel></rss>",
            "https://example.kr/feed",
            None,
            None,
        );

        assert!(result.records.is_empty());
        let error = result.meta.error.expect("error must be set");
        assert!(error.contains("parse"), "got: {}", error);
    }

    #[test]
    fn html_body_routes_to_table_mapper() {
        let html = r#"<html><body><table class="board_list"><tbody>
            <tr><td>1</td><td><a href="/x">제목</a></td><td>2025-07-01</td></tr>
        </tbody></table></body></html>"#;

        let extractor = Extractor::builder().build();
        let result = extractor.extract_html(html, "https://example.kr/board", None, None);

        assert!(!result.is_degraded());
        assert_eq!(result.records[0].title, "제목");
        assert_eq!(result.records[0].source_url, "https://example.kr/x");
        assert_eq!(result.meta.source_label, "example.kr");
    }

    #[tokio::test]
    async fn fetch_details_continues_past_failures() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/post/1");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(
                    r#"<html><body>
                        <p class="writer">교사</p>
                        <div class="content">본문</div>
                        <img src="/upload/a.jpg">
                    </body></html>"#,
                );
        });
        server.mock(|when, then| {
            when.method(GET).path("/post/2");
            then.status(404).body("gone");
        });

        let result = ExtractionResult::from_records(
            vec![
                NormalizedRecord {
                    sequence_number: "1".to_string(),
                    source_url: server.url("/post/1"),
                    ..Default::default()
                },
                NormalizedRecord {
                    sequence_number: "2".to_string(),
                    source_url: server.url("/post/2"),
                    ..Default::default()
                },
                NormalizedRecord {
                    sequence_number: "3".to_string(),
                    ..Default::default()
                },
            ],
            "앨범",
            server.url("/album"),
        );

        let extractor = Extractor::builder()
            .detail_delay(Duration::ZERO)
            .build();
        let details = extractor.fetch_details(&result).await;

        assert_eq!(details.len(), 3);
        assert_eq!(details[0].author, "교사");
        assert_eq!(details[0].content, "본문");
        assert_eq!(details[0].images.len(), 1);
        // Failed fetch and missing URL both degrade to the empty detail.
        assert_eq!(details[1], PostDetail::default());
        assert_eq!(details[2], PostDetail::default());
    }
}
