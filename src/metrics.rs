use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion and query activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_submitted: AtomicU64,
    status_polls: AtomicU64,
    operations_completed: AtomicU64,
    queries_answered: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted document upload.
    pub fn record_submission(&self) {
        self.documents_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one remote status fetch.
    pub fn record_poll(&self) {
        self.status_polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an operation observed as done.
    pub fn record_completion(&self) {
        self.operations_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a grounded answer returned to a caller.
    pub fn record_query(&self) {
        self.queries_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_submitted: self.documents_submitted.load(Ordering::Relaxed),
            status_polls: self.status_polls.load(Ordering::Relaxed),
            operations_completed: self.operations_completed.load(Ordering::Relaxed),
            queries_answered: self.queries_answered.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents accepted by the remote store.
    pub documents_submitted: u64,
    /// Status fetches issued while waiting for ingestion.
    pub status_polls: u64,
    /// Operations observed as done, successful or not.
    pub operations_completed: u64,
    /// Grounded answers returned.
    pub queries_answered: u64,
}
