use std::time::Duration;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::{RoundtableError, RoundtableResult};

use super::ExtractedContent;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "Mozilla/5.0 (Roundtable Context Fetcher)";

/// Content areas tried in order before falling back to the whole body.
const MAIN_SELECTORS: [&str; 9] = [
    "main",
    "article",
    "[role='main']",
    "#content",
    "#main",
    ".content",
    ".main",
    ".post-content",
    ".entry-content",
];

const BOILERPLATE_SELECTORS: [&str; 8] = [
    "nav", "header", "footer", "aside", "script", "style", "noscript", "iframe",
];

/// Fetches a web page and reduces it to readable plain text.
pub struct UrlExtractor {
    client: reqwest::Client,
}

impl UrlExtractor {
    pub fn new() -> RoundtableResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    pub async fn extract(&self, url: &str) -> RoundtableResult<ExtractedContent> {
        debug!(url = %url, "Fetching page for context extraction");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoundtableError::UrlFetchFailed(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let html = response.text().await?;
        let document = Html::parse_document(&html);

        let content = readable_text(&document);
        if content.trim().is_empty() {
            return Err(RoundtableError::NoReadableContent);
        }

        let title = extract_title(&document)
            .or_else(|| host_name(url))
            .unwrap_or_else(|| url.to_string());

        Ok(ExtractedContent { title, content })
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn host_name(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

/// Plain text of the page's main content area.
fn readable_text(document: &Html) -> String {
    for selector_str in MAIN_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(main) = document.select(&selector).next() {
                return text_of_fragment(&main.html());
            }
        }
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            return text_of_fragment(&body.html());
        }
    }

    String::new()
}

/// Strips boilerplate elements from an HTML fragment, then collects the
/// remaining text one trimmed piece per line.
fn text_of_fragment(html: &str) -> String {
    let cleaned = remove_boilerplate(html);
    let fragment = Html::parse_fragment(&cleaned);

    let mut lines: Vec<String> = Vec::new();
    for piece in fragment.root_element().text() {
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    lines.join("\n")
}

// Matching elements are serialized and cut out of the string, so the
// input must already be scraper-serialized HTML for replacements to hit.
fn remove_boilerplate(html: &str) -> String {
    let document = Html::parse_fragment(html);

    let mut result = html.to_string();
    for selector_str in BOILERPLATE_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                let element_html = element.html();
                result = result.replace(&element_html, "");
            }
        }
    }
    result
}
