//! Error definitions for the ingestion workflow.

use crate::store::{FileSearchError, UploadOperation};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while handing a document to the remote store.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The document could not be read from disk; nothing was sent.
    #[error("Failed to read document {}: {source}", path.display())]
    Unreadable {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The store reference was empty; nothing was sent.
    #[error("Store reference must not be empty")]
    InvalidStore,
    /// The remote service rejected the upload.
    #[error("Upload rejected: {0}")]
    Rejected(#[from] FileSearchError),
}

/// Errors raised while waiting for an operation to finish.
#[derive(Debug, Error)]
pub enum PollingError {
    /// The attempt cap was reached before the operation reported completion.
    ///
    /// Ingestion may still complete server-side later.
    #[error("Operation {} still running after {attempts} status checks", operation.name)]
    Timeout {
        /// Status checks performed.
        attempts: u32,
        /// Last snapshot observed.
        operation: Box<UploadOperation>,
    },
    /// The caller cancelled the wait. Ingestion continues server-side.
    #[error("Stopped waiting for operation {}", operation.name)]
    Cancelled {
        /// Last snapshot observed.
        operation: Box<UploadOperation>,
    },
    /// A status fetch failed.
    #[error("Failed to fetch operation status: {0}")]
    Status(#[from] FileSearchError),
}

/// Errors raised while asking a grounded question.
#[derive(Debug, Error)]
pub enum QueryError {
    /// No stores were supplied to ground the answer.
    #[error("At least one store is required to ground an answer")]
    NoStores,
    /// Prompt was empty after trimming.
    #[error("Prompt must not be empty")]
    EmptyPrompt,
    /// The remote model call failed.
    #[error("Grounded query failed: {0}")]
    Request(#[from] FileSearchError),
    /// The caller cancelled the query before an answer arrived.
    #[error("Grounded query cancelled")]
    Cancelled,
    /// The model returned no text.
    #[error("Model returned no answer{}", reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    EmptyAnswer {
        /// Block or finish reason reported by the model, if any.
        reason: Option<String>,
    },
}

/// Errors raised by the combined submit-and-wait workflow.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Submitting the document failed.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    /// Waiting for the operation failed.
    #[error(transparent)]
    Polling(#[from] PollingError),
    /// The operation finished with a server-side error.
    #[error("Ingestion of {operation} failed ({code}): {message}")]
    Failed {
        /// Operation name.
        operation: String,
        /// Status code reported by the server.
        code: i32,
        /// Diagnostic message reported by the server.
        message: String,
    },
}
