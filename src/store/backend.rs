//! Capabilities the ingestion poller consumes from the remote store.

use crate::store::types::{Answer, Document, FileSearchError, StoreRef, UploadOperation};
use async_trait::async_trait;

/// Remote ingestion and retrieval service.
#[async_trait]
pub trait FileSearchBackend: Send + Sync {
    /// Create a new store. Repeated calls may create distinct stores.
    async fn create_store(&self, display_name: &str) -> Result<StoreRef, FileSearchError>;

    /// Begin asynchronous ingestion of `document` into `store`, returning the operation handle.
    async fn upload(
        &self,
        document: Document,
        store: &StoreRef,
        display_name: Option<&str>,
    ) -> Result<UploadOperation, FileSearchError>;

    /// Fetch the current snapshot of an operation. Must be read-only on the remote side.
    async fn get_operation(
        &self,
        operation: &UploadOperation,
    ) -> Result<UploadOperation, FileSearchError>;

    /// Answer `prompt` using the content indexed in `stores`.
    async fn generate_grounded_answer(
        &self,
        prompt: &str,
        stores: &[StoreRef],
        model: &str,
    ) -> Result<Answer, FileSearchError>;
}
