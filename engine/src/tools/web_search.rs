//! Web search tool
//!
//! Queries the DuckDuckGo Instant Answer API (no key required) and
//! returns the abstract or direct answer when one exists.

use super::ToolInput;
use std::time::Duration;

const SEARCH_TIMEOUT_SECS: u64 = 10;

pub struct WebSearchTool {
    endpoint: String,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    pub async fn invoke(&self, input: &ToolInput) -> String {
        let Some(query) = input.free_text() else {
            return "Web search error: expected a search query".to_string();
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await;

        let data: serde_json::Value = match response {
            Ok(r) => match r.json().await {
                Ok(v) => v,
                Err(e) => return format!("Web search error: {}", e),
            },
            Err(e) => return format!("Web search error: {}", e),
        };

        let abstract_text = data.get("Abstract").and_then(|v| v.as_str()).unwrap_or("");
        let answer = data.get("Answer").and_then(|v| v.as_str()).unwrap_or("");

        if !abstract_text.is_empty() {
            format!("Web search result for '{}': {}", query, abstract_text)
        } else if !answer.is_empty() {
            format!("Web search result for '{}': {}", query, answer)
        } else {
            format!(
                "No direct answer found for '{}'. Try rephrasing your search.",
                query
            )
        }
    }
}
