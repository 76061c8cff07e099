//! Collaborator service traits
//!
//! The engine consumes two external services through these narrow
//! interfaces: a completion service that turns prompts into text, and a
//! retrieval service that turns a query into scored candidate documents.
//! Implementations live in the engine crate (or in tests, as scripted
//! fakes); the orchestration core only ever sees these traits.

use crate::types::ScoredDocument;
use async_trait::async_trait;

/// Errors a completion service can report.
///
/// The orchestration layers treat all of these uniformly: the failing call
/// is replaced by fallback text and the pipeline continues. The variants
/// exist so providers can log and callers can health-check meaningfully.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors a retrieval service can report.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Retrieval service unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A text-completion backend.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Provider name for logs and diagnostics (e.g., "gemini")
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`, optionally under `system_prompt`.
    ///
    /// A failing call must be cheap to consume: the engine substitutes
    /// fallback text and never propagates the error to its own caller.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, CompletionError>;

    /// Whether the provider is currently usable. Checked once at startup;
    /// a dead provider is the one condition reported distinctly.
    async fn check_health(&self) -> bool {
        true
    }
}

/// A similarity-search backend over an external document index.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Backend name for logs and diagnostics
    fn name(&self) -> &str;

    /// Return up to `k` candidate documents for `query`, best first.
    async fn search(&self, query: &str, k: usize)
        -> Result<Vec<ScoredDocument>, RetrievalError>;
}
