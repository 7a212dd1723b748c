//! Report submission with compensating delete.
//!
//! `create -> enqueue -> (on rejection) delete`. The three steps are not one
//! transaction: a crash after `create` and before `enqueue` returns leaves a
//! `Running` record that no worker will ever pick up.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use storewatch_core::ReportId;

use crate::jobs::{DispatchOutcome, ReportQueue, ReportStore};

use super::error::ReportServiceError;

#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn ReportStore>,
    queue: Arc<dyn ReportQueue>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn ReportStore>, queue: Arc<dyn ReportQueue>) -> Self {
        Self { store, queue }
    }

    /// Create a `Running` job and dispatch it.
    ///
    /// On success the id is returned; the worker may not have started yet. If
    /// the queue rejects the job, the record is deleted before the queue's
    /// message is returned as [`ReportServiceError::Dispatch`].
    #[instrument(skip(self), err)]
    pub async fn submit(&self) -> Result<ReportId, ReportServiceError> {
        let job = self.store.create().await?;
        let id = job.report_id();

        match self.queue.enqueue(id).await {
            DispatchOutcome::Accepted => {
                info!(report_id = %id, "report dispatched");
                Ok(id)
            }
            DispatchOutcome::Rejected { reason } => {
                warn!(report_id = %id, %reason, "dispatch rejected; removing report");
                if let Err(e) = self.store.delete(id).await {
                    // The record is now an orphan; surface the dispatch failure anyway.
                    warn!(report_id = %id, error = %e, "compensating delete failed");
                }
                Err(ReportServiceError::Dispatch(reason))
            }
        }
    }
}
