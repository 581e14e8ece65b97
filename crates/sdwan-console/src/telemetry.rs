//! Per-link dispatch counters.
//!
//! The session observes each dispatch handle in a detached task so that
//! controller acknowledgement never gates the sequencer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::SendOutcome;

#[derive(Debug, Default)]
pub struct LinkTelemetry {
    sent: AtomicU64,
    rejected: AtomicU64,
    acknowledged: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCounters {
    pub sent: u64,
    pub rejected: u64,
    pub acknowledged: u64,
    pub failed: u64,
}

impl LinkTelemetry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Count a send and, if dispatched, watch for its completion.
    ///
    /// Must be called from within a tokio runtime when the outcome is `Sent`.
    pub fn observe(self: &Arc<Self>, outcome: SendOutcome) {
        match outcome {
            SendOutcome::Rejected => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
            }
            SendOutcome::Sent(dispatch) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    let counter = match dispatch.outcome().await {
                        Ok(()) => &this.acknowledged,
                        Err(_) => &this.failed,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                });
            }
        }
    }

    pub fn counters(&self) -> LinkCounters {
        LinkCounters {
            sent: self.sent.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Dispatch, TransportError};

    #[tokio::test]
    async fn counts_rejections_and_completions() {
        let telemetry = LinkTelemetry::new();
        telemetry.observe(SendOutcome::Rejected);
        telemetry.observe(SendOutcome::Sent(Dispatch::ready(Ok(()))));
        telemetry.observe(SendOutcome::Sent(Dispatch::ready(Err(
            TransportError::Status(500),
        ))));

        // Let the completion watchers run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            telemetry.counters(),
            LinkCounters {
                sent: 2,
                rejected: 1,
                acknowledged: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn dropped_dispatch_counts_as_failed() {
        let telemetry = LinkTelemetry::new();
        let (tx, dispatch) = Dispatch::pending();
        telemetry.observe(SendOutcome::Sent(dispatch));
        drop(tx);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(telemetry.counters().failed, 1);
    }
}
