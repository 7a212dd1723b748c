//! Dispatch of report jobs to a worker.
//!
//! Dispatch is fire-and-forget: an `Accepted` outcome only means the queue took
//! the id, not that the report has started.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use storewatch_core::ReportId;

/// Result of handing a job id to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Accepted,
    Rejected { reason: String },
}

impl DispatchOutcome {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, DispatchOutcome::Accepted)
    }
}

/// Queue collaborator that forwards job ids to whatever executes reports.
///
/// Transport failures are reported as `Rejected`, never as a panic or a
/// separate error channel.
#[async_trait]
pub trait ReportQueue: Send + Sync {
    async fn enqueue(&self, id: ReportId) -> DispatchOutcome;
}

#[async_trait]
impl<T: ReportQueue + ?Sized> ReportQueue for Arc<T> {
    async fn enqueue(&self, id: ReportId) -> DispatchOutcome {
        (**self).enqueue(id).await
    }
}

/// Bounded in-process queue feeding a [`crate::jobs::ReportWorker`].
///
/// Never waits for capacity: a full channel is a rejection.
#[derive(Debug, Clone)]
pub struct LocalReportQueue {
    tx: mpsc::Sender<ReportId>,
}

impl LocalReportQueue {
    /// Create the queue and the receiving end for the worker.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ReportId>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ReportQueue for LocalReportQueue {
    async fn enqueue(&self, id: ReportId) -> DispatchOutcome {
        match self.tx.try_send(id) {
            Ok(()) => DispatchOutcome::Accepted,
            Err(mpsc::error::TrySendError::Full(_)) => DispatchOutcome::rejected(format!(
                "report queue is full (capacity {})",
                self.tx.max_capacity()
            )),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                DispatchOutcome::rejected("report worker is not running")
            }
        }
    }
}
