//! Document ingestion workflow: submit, wait for the remote operation, then query.

pub mod poller;
mod service;
pub mod types;

pub use poller::{CancelHandle, CancelToken, PollSettings};
pub use service::IngestionService;
pub use types::{IngestionError, PollingError, QueryError, SubmissionError};
