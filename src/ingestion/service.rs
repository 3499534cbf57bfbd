//! Ingestion service coordinating uploads, status polling, and grounded queries.

use crate::{
    config::Config,
    ingestion::{
        poller::{CancelToken, PollSettings},
        types::{IngestionError, PollingError, QueryError, SubmissionError},
    },
    metrics::{IngestMetrics, MetricsSnapshot},
    store::{Answer, Document, FileSearchBackend, FileSearchError, StoreRef, UploadOperation},
};
use std::path::Path;
use std::sync::Arc;

/// Drives the upload → wait → query workflow against a [`FileSearchBackend`].
///
/// The service performs at most one outstanding request per operation and never retries;
/// every failure surfaces to the caller. Waiting suspends the calling task instead of
/// blocking its thread.
pub struct IngestionService<B> {
    backend: B,
    settings: PollSettings,
    model: String,
    metrics: Arc<IngestMetrics>,
}

impl<B> IngestionService<B>
where
    B: FileSearchBackend,
{
    /// Build a service using the polling settings and model from `config`.
    pub fn new(backend: B, config: &Config) -> Self {
        Self::with_settings(backend, PollSettings::from_config(config), config.model.clone())
    }

    /// Build a service with explicit polling settings and model.
    pub fn with_settings(backend: B, settings: PollSettings, model: impl Into<String>) -> Self {
        Self {
            backend,
            settings,
            model: model.into(),
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Polling settings used by [`Self::ingest`].
    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Create a new remote store.
    pub async fn create_store(&self, display_name: &str) -> Result<StoreRef, FileSearchError> {
        self.backend.create_store(display_name).await
    }

    /// Read `path` and start ingesting it into `store`.
    ///
    /// The returned operation may already be done. Unreadable documents and blank store
    /// references fail before any request is sent.
    pub async fn submit(
        &self,
        path: &Path,
        store: &StoreRef,
        display_name: Option<&str>,
    ) -> Result<UploadOperation, SubmissionError> {
        if store.is_blank() {
            return Err(SubmissionError::InvalidStore);
        }

        let document =
            Document::read(path)
                .await
                .map_err(|source| SubmissionError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })?;

        tracing::info!(
            store = %store.resource_name(),
            file = %document.file_name,
            mime_type = %document.mime_type,
            bytes = document.bytes.len(),
            "Submitting document"
        );
        let operation = self.backend.upload(document, store, display_name).await?;
        self.metrics.record_submission();
        Ok(operation)
    }

    /// Wait until `operation` reports completion, re-fetching its status every interval.
    ///
    /// An operation that is already done returns immediately without sleeping. When
    /// `settings.max_attempts` is reached first, fails with [`PollingError::Timeout`].
    /// `cancel` is checked before each attempt and raced against each sleep.
    pub async fn poll_until_done(
        &self,
        mut operation: UploadOperation,
        settings: &PollSettings,
        cancel: Option<&CancelToken>,
    ) -> Result<UploadOperation, PollingError> {
        let mut attempts: u32 = 0;

        while !operation.done {
            if settings.exhausted(attempts) {
                tracing::warn!(
                    operation = %operation.name,
                    attempts,
                    "Gave up waiting for ingestion"
                );
                return Err(PollingError::Timeout {
                    attempts,
                    operation: Box::new(operation),
                });
            }
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(cancelled(operation));
            }

            attempts += 1;
            tracing::info!(
                operation = %operation.name,
                attempt = attempts,
                interval = ?settings.interval,
                "Importing document, please wait"
            );

            match cancel {
                Some(token) => {
                    tokio::select! {
                        () = tokio::time::sleep(settings.interval) => {}
                        () = token.cancelled() => return Err(cancelled(operation)),
                    }
                }
                None => tokio::time::sleep(settings.interval).await,
            }

            operation = self.backend.get_operation(&operation).await?;
            self.metrics.record_poll();
        }

        self.metrics.record_completion();
        tracing::info!(
            operation = %operation.name,
            attempts,
            succeeded = operation.succeeded(),
            "Ingestion finished"
        );
        Ok(operation)
    }

    /// Submit a document and wait for ingestion using the configured settings.
    ///
    /// Operations that finish with a server-side error become [`IngestionError::Failed`].
    pub async fn ingest(
        &self,
        path: &Path,
        store: &StoreRef,
        display_name: Option<&str>,
        cancel: Option<&CancelToken>,
    ) -> Result<UploadOperation, IngestionError> {
        let operation = self.submit(path, store, display_name).await?;
        let operation = self
            .poll_until_done(operation, &self.settings, cancel)
            .await?;

        match &operation.error {
            Some(error) => Err(IngestionError::Failed {
                operation: operation.name.clone(),
                code: error.code,
                message: error.message.clone(),
            }),
            None => Ok(operation),
        }
    }

    /// Answer `prompt` using the content indexed in `stores`.
    ///
    /// Does not check that ingestion into `stores` has finished.
    pub async fn query_with_context(
        &self,
        prompt: &str,
        stores: &[StoreRef],
    ) -> Result<Answer, QueryError> {
        if stores.is_empty() {
            return Err(QueryError::NoStores);
        }
        if prompt.trim().is_empty() {
            return Err(QueryError::EmptyPrompt);
        }

        tracing::debug!(model = %self.model, stores = stores.len(), "Requesting grounded answer");
        let answer = self
            .backend
            .generate_grounded_answer(prompt, stores, &self.model)
            .await?;

        if answer.text.trim().is_empty() {
            return Err(QueryError::EmptyAnswer {
                reason: answer.block_reason,
            });
        }

        self.metrics.record_query();
        tracing::info!(
            model = %self.model,
            sources = answer.sources.len(),
            "Grounded answer received"
        );
        Ok(answer)
    }

    /// Like [`Self::query_with_context`], but gives up as soon as `cancel` fires.
    ///
    /// The in-flight request is dropped; the remote call itself cannot be recalled.
    pub async fn query_or_cancel(
        &self,
        prompt: &str,
        stores: &[StoreRef],
        cancel: &CancelToken,
    ) -> Result<Answer, QueryError> {
        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }

        tokio::select! {
            result = self.query_with_context(prompt, stores) => result,
            () = cancel.cancelled() => {
                tracing::info!("Stopped waiting for grounded answer");
                Err(QueryError::Cancelled)
            }
        }
    }

    /// Return the current activity counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn cancelled(operation: UploadOperation) -> PollingError {
    tracing::info!(operation = %operation.name, "Stopped waiting; ingestion continues remotely");
    PollingError::Cancelled {
        operation: Box::new(operation),
    }
}
