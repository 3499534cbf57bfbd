//! Shared types used by the File Search client and the ingestion poller.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

const STORE_PREFIX: &str = "fileSearchStores/";

/// Errors returned while interacting with the File Search API.
#[derive(Debug, Error)]
pub enum FileSearchError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid File Search URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API responded with an unexpected status code.
    #[error("Unexpected File Search response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the API.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// A resumable upload session was opened without an upload URL.
    #[error("Upload session response did not include an upload URL")]
    MissingUploadUrl,
}

/// Reference to a remote store that indexes documents for retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRef {
    /// Resource name, e.g. `fileSearchStores/abc123`.
    pub name: String,
    /// Human-readable name chosen at creation time.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl StoreRef {
    /// Reference an existing store by resource name or bare identifier.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
        }
    }

    /// Fully qualified resource name used in request paths.
    pub fn resource_name(&self) -> String {
        let name = self.name.trim().trim_matches('/');
        if name.starts_with(STORE_PREFIX) {
            name.to_string()
        } else {
            format!("{STORE_PREFIX}{name}")
        }
    }

    /// Whether the reference names anything at all.
    pub fn is_blank(&self) -> bool {
        self.name.trim().trim_matches('/').is_empty()
    }
}

/// Error reported by the server for a finished operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperationError {
    /// Status code reported by the server.
    #[serde(default)]
    pub code: i32,
    /// Diagnostic message.
    #[serde(default)]
    pub message: String,
}

/// Snapshot of an asynchronous ingestion job.
///
/// Instances are replaced wholesale by re-fetching status; they are never mutated locally.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadOperation {
    /// Opaque operation name used to re-fetch status.
    pub name: String,
    /// Whether the outcome is final. Absent on the wire while the job is still running.
    #[serde(default)]
    pub done: bool,
    /// Result payload for successful operations.
    #[serde(default)]
    pub response: Option<Value>,
    /// Error payload for failed operations.
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl UploadOperation {
    /// Whether the operation finished without a server-side error.
    pub fn succeeded(&self) -> bool {
        self.done && self.error.is_none()
    }
}

/// Document read from disk and ready to upload.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name without directories.
    pub file_name: String,
    /// MIME type announced to the upload endpoint.
    pub mime_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl Document {
    /// Read a document from `path`, inferring its MIME type from the extension.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let mime_type = mime_type_for(path).to_string();
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "txt" | "text" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}

/// Retrieved context that grounded an answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroundingSource {
    /// Title of the matched document, if reported.
    pub title: Option<String>,
    /// Matched excerpt, if reported.
    pub text: Option<String>,
    /// URI of the matched document, if reported.
    pub uri: Option<String>,
}

/// Grounded answer produced by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// Free-text answer.
    pub text: String,
    /// Provenance for the answer, in the order returned by the API.
    pub sources: Vec<GroundingSource>,
    /// Reason the prompt or candidate was blocked, when the model produced no text.
    #[serde(skip)]
    pub block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<Content>,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
    #[serde(default)]
    pub(crate) grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub(crate) parts: Vec<Part>,
}

#[derive(Deserialize)]
pub(crate) struct Part {
    #[serde(default)]
    pub(crate) text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub(crate) block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    #[serde(default)]
    pub(crate) grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingChunk {
    #[serde(default)]
    pub(crate) retrieved_context: Option<RetrievedContext>,
}

#[derive(Deserialize)]
pub(crate) struct RetrievedContext {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) uri: Option<String>,
}

impl GenerateContentResponse {
    pub(crate) fn into_answer(self) -> Answer {
        let block_reason = self
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Answer {
                block_reason,
                ..Answer::default()
            };
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        let sources = candidate
            .grounding_metadata
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.retrieved_context)
                    .map(|context| GroundingSource {
                        title: context.title,
                        text: context.text,
                        uri: context.uri,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let block_reason = if text.trim().is_empty() {
            block_reason.or(candidate.finish_reason)
        } else {
            block_reason
        };

        Answer {
            text,
            sources,
            block_reason,
        }
    }
}
