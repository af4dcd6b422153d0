//! Debounced actions
//!
//! Cancel-pending-and-resubmit-after-quiet-period, for address and district
//! autocomplete lookups. Each call aborts the previously scheduled action
//! before scheduling the new one; this suppresses the next enqueue only — an
//! action already executing is not cancelled mid-request.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Schedules at most one pending action at a time.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// A debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `action` after the quiet period, dropping any action still
    /// waiting from a previous call.
    pub fn call<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    /// Drop the pending action, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
