//! Error types and handling
//!
//! The engine's user-visible failure mode is always a textual answer, so
//! very few conditions surface as typed errors. The ones that do are the
//! startup-time problems the caller must be able to tell apart: a broken
//! configuration, and a completion service that is entirely unavailable
//! (in which case the caller decides whether to serve degraded).

use thiserror::Error;

/// Engine-level error type
///
/// Everything past startup is handled inside the pipeline by substituting
/// fallback text; these variants only appear while wiring the engine up.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The completion service cannot be reached at all. Reported distinctly
    /// so the caller can decide whether to serve degraded functionality.
    #[error("Completion service unavailable: {0}")]
    CompletionUnavailable(String),

    /// Filesystem failure while loading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
