//! HTTP retriever
//!
//! Posts `{"query": ..., "k": ...}` to a configured endpoint and expects a
//! JSON array of scored documents back, best first. The index itself
//! (embedding, chunking, storage) is someone else's problem.

use async_trait::async_trait;
use sdk::services::{RetrievalError, Retriever};
use sdk::types::ScoredDocument;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Request timeout; retrieval is expected to be fast compared to the LLM.
const RETRIEVAL_TIMEOUT_SECS: u64 = 30;

pub struct HttpRetriever {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRetriever {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(RETRIEVAL_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, RetrievalError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({"query": query, "k": k}))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    RetrievalError::Unavailable(e.to_string())
                } else {
                    RetrievalError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(RetrievalError::Unavailable(format!(
                "retrieval endpoint returned {}",
                response.status()
            )));
        }

        let documents: Vec<ScoredDocument> = response
            .json()
            .await
            .map_err(|e| RetrievalError::Parse(e.to_string()))?;

        debug!(
            "Retrieved {} candidates for query ({} chars)",
            documents.len(),
            query.len()
        );

        Ok(documents)
    }
}
