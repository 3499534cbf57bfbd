//! Gemini File Search store integration.

pub mod backend;
pub mod client;
pub mod types;

pub use backend::FileSearchBackend;
pub use client::FileSearchService;
pub use types::{
    Answer, Document, FileSearchError, GroundingSource, OperationError, StoreRef,
    UploadOperation,
};
