//! Shared data types
//!
//! Types that cross the boundary between the engine and its collaborator
//! services.

use serde::{Deserialize, Serialize};

/// A retrieved candidate document with its similarity score.
///
/// Scores follow the cosine-distance convention: **lower is more similar**.
/// Produced by the retrieval service, consumed read-only by the engine's
/// relevance filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// Document text
    pub content: String,

    /// Cosine distance from the query (lower = more similar)
    pub score: f64,

    /// Flat scalar metadata attached by the retrieval service
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ScoredDocument {
    /// Create a document with empty metadata
    pub fn new(content: impl Into<String>, score: f64) -> Self {
        Self {
            content: content.into(),
            score,
            metadata: serde_json::Map::new(),
        }
    }
}
