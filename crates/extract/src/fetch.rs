// ABOUTME: HTTP fetching for board pages and feeds.
// ABOUTME: Browser user-agent, bounded timeout, charset-aware body decoding.

use std::time::Duration;

use bytes::Bytes;

use crate::error::ExtractError;

/// School portals reject obvious bot clients, so requests present a
/// desktop browser by default.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Default per-request socket timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    /// URL after redirects; link resolution uses this as the base.
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decodes the body to text using the content-type charset when one is
    /// declared, falling back to detection. Portal pages are frequently
    /// EUC-KR rather than UTF-8.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Builds the shared HTTP client used for every request of an extractor.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .expect("failed to build HTTP client")
}

/// Fetches a single page.
///
/// Any transport problem, timeout, or non-2xx status becomes
/// `ExtractError::Fetch`; callers fold that into a degraded result.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<FetchResult, ExtractError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| ExtractError::fetch(format!("invalid URL {}: {}", url, e)))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ExtractError::fetch(format!(
            "unsupported scheme {} in {}",
            scheme, url
        )));
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ExtractError::fetch(format!("request failed: {}", e)))?;

    let status = response.status();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    if !status.is_success() {
        return Err(ExtractError::fetch(format!(
            "HTTP status {} from {}",
            status.as_u16(),
            final_url
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ExtractError::fetch(format!("failed to read body: {}", e)))?;

    Ok(FetchResult {
        status: status.as_u16(),
        final_url,
        content_type,
        body,
    })
}

/// Decodes body bytes to a String using the declared charset or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extracts the charset value from a Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}
