//! Sage Engine Library
//!
//! Query-orchestration core for the Sage assistant. One query flows
//! through: session resolution, conversation windowing, retrieval plus
//! relevance filtering, and the bounded tool loop against the completion
//! service. This library is used by the `sage` binary and the
//! integration tests.

/// Configuration management module
pub mod config;

/// Conversation session store
pub mod conversation;

/// Relevance filtering of retrieval candidates
pub mod relevance;

/// Completion service implementations
pub mod llm;

/// Retrieval service implementations
pub mod retrieval;

/// Built-in tools and their registry
pub mod tools;

/// Tool loop state machine
pub mod agent;

/// Top-level query orchestration
pub mod orchestrator;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;
