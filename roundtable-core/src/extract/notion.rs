use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{RoundtableError, RoundtableResult};

use super::ExtractedContent;

const NOTION_API_BASE: &str = "https://api.notion.com";
const NOTION_API_VERSION: &str = "2022-06-28";
const BLOCK_PAGE_SIZE: u32 = 100;

// Page URLs end in either a compact 32-hex id or a dashed UUID.
static COMPACT_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[a-f0-9]{32}").unwrap());
static DASHED_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[a-f0-9-]{36}").unwrap());

/// Pulls the title and block text of a Notion page through the public API.
pub struct NotionExtractor {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NotionExtractor {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, NOTION_API_BASE.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    pub async fn extract(&self, page_url: &str) -> RoundtableResult<ExtractedContent> {
        let page_id = page_id(page_url).ok_or(RoundtableError::InvalidNotionUrl)?;
        debug!(page_id = %page_id, "Extracting Notion page");

        let page = self
            .get_json(&format!("{}/v1/pages/{}", self.base_url, page_id))
            .await?;
        let title = page_title(&page);

        let mut blocks: Vec<String> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut url = format!(
                "{}/v1/blocks/{}/children?page_size={}",
                self.base_url, page_id, BLOCK_PAGE_SIZE
            );
            if let Some(cursor) = &cursor {
                url.push_str("&start_cursor=");
                url.push_str(cursor);
            }

            let response = self.get_json(&url).await?;
            for block in response["results"].as_array().into_iter().flatten() {
                if let Some(text) = block_text(block) {
                    blocks.push(text);
                }
            }

            cursor = if response["has_more"].as_bool().unwrap_or(false) {
                response["next_cursor"].as_str().map(|c| c.to_string())
            } else {
                None
            };
            if cursor.is_none() {
                break;
            }
        }

        let content = blocks.join("\n");
        if content.trim().is_empty() {
            return Err(RoundtableError::NoReadableContent);
        }

        let title = if title.is_empty() {
            "Notion Page".to_string()
        } else {
            title
        };

        Ok(ExtractedContent { title, content })
    }

    async fn get_json(&self, url: &str) -> RoundtableResult<Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(RoundtableError::ApiAuthenticationFailed {
                service: "notion".to_string(),
                message: status.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RoundtableError::ApiRequestFailed(format!(
                "Notion API returned status: {status}"
            )));
        }

        Ok(response.json().await?)
    }
}

fn page_id(url: &str) -> Option<String> {
    COMPACT_ID_RE
        .find(url)
        .or_else(|| DASHED_ID_RE.find(url))
        .map(|m| m.as_str().to_string())
}

/// First title-typed property, with its rich-text runs joined.
fn page_title(page: &Value) -> String {
    let Some(props) = page["properties"].as_object() else {
        return String::new();
    };

    for prop in props.values() {
        if prop["type"].as_str() != Some("title") {
            continue;
        }
        if let Some(parts) = prop["title"].as_array() {
            if !parts.is_empty() {
                return parts
                    .iter()
                    .filter_map(|part| part["plain_text"].as_str())
                    .collect();
            }
        }
    }
    String::new()
}

/// Plain text of one block, whatever its type, or `None` when it has none.
fn block_text(block: &Value) -> Option<String> {
    let kind = block["type"].as_str()?;
    let data = block.get(kind)?;

    let runs = data
        .get("rich_text")
        .or_else(|| data.get("text"))?
        .as_array()?;
    let text: String = runs
        .iter()
        .filter_map(|run| run["plain_text"].as_str())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
