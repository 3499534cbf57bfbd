//! Polling settings and cancellation for operation waits.

use crate::config::Config;
use std::time::Duration;
use tokio::sync::watch;

/// Fixed-interval polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay before each status check.
    pub interval: Duration,
    /// Optional cap on status checks. `None` waits until the operation reports completion.
    pub max_attempts: Option<u32>,
}

impl PollSettings {
    /// Poll every `interval` with no attempt cap.
    pub const fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Cap the number of status checks.
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Settings derived from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
        }
    }

    pub(crate) fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::every(Duration::from_secs(crate::config::DEFAULT_POLL_INTERVAL_SECS))
    }
}

/// Sending half used to stop a wait early.
#[derive(Debug, Clone)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// Signal cancellation to every linked token.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Receiving half checked by the poll loop.
#[derive(Debug, Clone)]
pub struct CancelToken(watch::Receiver<bool>);

impl CancelToken {
    /// Create a linked handle and token.
    pub fn pair() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle(tx), CancelToken(rx))
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once cancellation is signalled. Never resolves if the handle is dropped first.
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_cap_is_optional() {
        let unbounded = PollSettings::every(Duration::from_secs(1));
        assert!(!unbounded.exhausted(u32::MAX));

        let capped = unbounded.with_max_attempts(2);
        assert!(!capped.exhausted(1));
        assert!(capped.exhausted(2));
    }

    #[test]
    fn default_interval_is_five_seconds() {
        assert_eq!(PollSettings::default().interval, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancel_reaches_clones() {
        let (handle, token) = CancelToken::pair();
        let clone = token.clone();
        assert!(!token.is_cancelled());

        handle.cancel();

        assert!(token.is_cancelled());
        clone.cancelled().await;
    }
}
