//! URL content fetcher tool
//!
//! Fetches a page, strips HTML tags, collapses whitespace, and returns
//! the first 500 characters. Bare hostnames get an https:// prefix.

use super::ToolInput;
use regex::Regex;
use std::time::Duration;

const FETCH_TIMEOUT_SECS: u64 = 10;

/// Characters of cleaned text returned to the model
const MAX_CONTENT_CHARS: usize = 500;

pub struct UrlFetchTool {
    client: reqwest::Client,
    tag_pattern: Regex,
}

impl UrlFetchTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            tag_pattern: Regex::new(r"<[^>]+>").expect("static tag pattern is valid"),
        }
    }

    pub async fn invoke(&self, input: &ToolInput) -> String {
        let Some(url) = input.free_text() else {
            return "URL content error: expected a URL".to_string();
        };

        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{}", url)
        };

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return format!("URL content error: {}", e),
        };

        if !response.status().is_success() {
            return format!("URL content error: {} returned {}", url, response.status());
        }

        let body = match response.text().await {
            Ok(t) => t,
            Err(e) => return format!("URL content error: {}", e),
        };

        let stripped = self.tag_pattern.replace_all(&body, " ");
        let clean = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        let snippet: String = clean.chars().take(MAX_CONTENT_CHARS).collect();

        format!("Content from {}: {}...", url, snippet)
    }
}

impl Default for UrlFetchTool {
    fn default() -> Self {
        Self::new()
    }
}
