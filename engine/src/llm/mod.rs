//! Completion service implementations
//!
//! The orchestration core only knows the `CompletionService` trait from
//! the SDK; this module provides the Gemini-backed implementation used by
//! the binary.

pub mod gemini;

pub use gemini::GeminiClient;
