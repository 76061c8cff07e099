//! Sage SDK
//!
//! Shared library providing the types and traits that connect the Sage
//! engine to its external collaborators (completion service, retrieval
//! service). This crate carries no I/O of its own.

/// Error types and handling
pub mod errors;

/// Collaborator service traits
pub mod services;

/// Shared data types
pub mod types;

// Re-export commonly used types
pub use errors::EngineError;
pub use services::{CompletionError, CompletionService, RetrievalError, Retriever};
pub use types::ScoredDocument;
