//! Retrieval service implementations
//!
//! The engine consumes the `Retriever` trait from the SDK; this module
//! provides the HTTP-backed implementation for an external similarity
//! search service.

pub mod http;

pub use http::HttpRetriever;
