// ABOUTME: Detail-page extraction for album-style posts.
// ABOUTME: Pulls body text, author, and full-size image URLs out of a post page.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::table::element_text;

/// Body-content selectors tried in priority order.
const CONTENT_SELECTORS: &[&str] = &[
    ".board_view_content",
    ".content",
    ".post-content",
    ".article-content",
    ".board_content",
    "#content",
    ".view_content",
];

/// Author selectors tried in priority order.
const AUTHOR_SELECTORS: &[&str] = &[".writer", ".author", ".user_name", ".post_author"];

/// Extensions accepted as real photos.
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

/// Src substrings that mark thumbnails and chrome rather than content.
const EXCLUDED_IMAGE_HINTS: &[&str] = &["thumb", "small", "icon", "logo"];

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// What a single post's detail page yields. All fields degrade to empty
/// when the page lacks them or the fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    /// Absolute URLs of content photos, in document order.
    pub images: Vec<String>,
    /// Plain text of the post body.
    pub content: String,
    pub author: String,
}

/// Extracts photos, body text, and author from a post detail page.
pub fn extract_post_detail(body: &str, page_url: &str) -> PostDetail {
    let doc = Html::parse_document(body);

    let mut images = Vec::new();
    for img in doc.select(&IMG) {
        if let Some(src) = img.value().attr("src") {
            if let Some(resolved) = resolve_image_src(src, page_url) {
                images.push(resolved);
            }
        }
    }

    PostDetail {
        images,
        content: first_selector_text(&doc, CONTENT_SELECTORS),
        author: first_selector_text(&doc, AUTHOR_SELECTORS),
    }
}

/// Resolves an image src to an absolute URL, keeping only content photos.
fn resolve_image_src(src: &str, page_url: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }

    let absolute = if src.starts_with("http://") || src.starts_with("https://") {
        src.to_string()
    } else {
        Url::parse(page_url).and_then(|base| base.join(src)).ok()?.to_string()
    };

    let lower = absolute.to_lowercase();
    if !IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
        return None;
    }
    // The big originals are the content; skip thumbnails and site chrome.
    if EXCLUDED_IMAGE_HINTS.iter().any(|hint| lower.contains(hint)) {
        return None;
    }

    Some(absolute)
}

/// Text of the first element matching any selector in the cascade.
fn first_selector_text(doc: &Html, selectors: &[&str]) -> String {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(el) = doc.select(&selector).next() {
                return element_text(&el);
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE_URL: &str = "https://school.example.kr/album/view?id=10";

    #[test]
    fn extracts_content_author_and_images() {
        let html = r#"<html><body>
            <p class="writer">담임 교사</p>
            <div class="board_view_content">운동회 사진입니다. <b>즐거웠어요.</b></div>
            <img src="/upload/photo1.jpg">
            <img src="https://cdn.example.kr/photo2.png">
        </body></html>"#;

        let detail = extract_post_detail(html, PAGE_URL);
        assert_eq!(detail.author, "담임 교사");
        assert_eq!(detail.content, "운동회 사진입니다. 즐거웠어요.");
        assert_eq!(
            detail.images,
            vec![
                "https://school.example.kr/upload/photo1.jpg".to_string(),
                "https://cdn.example.kr/photo2.png".to_string(),
            ]
        );
    }

    #[test]
    fn thumbnails_and_chrome_are_filtered() {
        let html = r#"<html><body>
            <img src="/upload/photo1_thumb.jpg">
            <img src="/images/logo.png">
            <img src="/icons/small-clip.gif">
            <img src="/upload/real.jpeg">
            <img src="/scripts/app.js">
        </body></html>"#;

        let detail = extract_post_detail(html, PAGE_URL);
        assert_eq!(
            detail.images,
            vec!["https://school.example.kr/upload/real.jpeg".to_string()]
        );
    }

    #[test]
    fn selector_cascade_takes_first_match() {
        let html = r#"<html><body>
            <div class="content">뒤에 있는 본문</div>
            <div class="board_view_content">우선되는 본문</div>
        </body></html>"#;

        let detail = extract_post_detail(html, PAGE_URL);
        assert_eq!(detail.content, "우선되는 본문");
    }

    #[test]
    fn missing_everything_degrades_to_empty() {
        let detail = extract_post_detail("<html><body><p>hi</p></body></html>", PAGE_URL);
        assert_eq!(detail, PostDetail::default());
    }
}
