#![deny(missing_docs)]

//! Upload documents to a Gemini File Search store, wait for ingestion, and ask grounded
//! questions about them.

/// Explicit configuration loaded from the environment.
pub mod config;
/// Document submission, operation polling, and grounded queries.
pub mod ingestion;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion activity counters.
pub mod metrics;
/// File Search store client and wire types.
pub mod store;
