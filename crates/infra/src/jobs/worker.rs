//! In-process report worker.
//!
//! Drains a [`LocalReportQueue`](super::LocalReportQueue) receiver, hands each
//! id to a [`ReportBuilder`] and records the outcome in the store. What a report
//! contains is entirely the builder's business.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use storewatch_core::{ArtifactLocation, ReportId, ReportStatus};

use super::store::{ReportStore, StoreError};

/// Opaque, possibly long-running report computation.
#[async_trait]
pub trait ReportBuilder: Send + Sync + 'static {
    /// Produce the artifact for `id` and return where it can be fetched.
    async fn build(&self, id: ReportId) -> Result<ArtifactLocation, BuildError>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("report build failed: {0}")]
pub struct BuildError(pub String);

impl BuildError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Builder that only names the artifact (`<prefix>/<id>.csv`).
///
/// Stands in for a real builder in development setups; nothing is written.
#[derive(Debug, Clone)]
pub struct PlaceholderReportBuilder {
    prefix: String,
}

impl PlaceholderReportBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for PlaceholderReportBuilder {
    fn default() -> Self {
        Self::new("/files")
    }
}

#[async_trait]
impl ReportBuilder for PlaceholderReportBuilder {
    async fn build(&self, id: ReportId) -> Result<ArtifactLocation, BuildError> {
        let location = format!("{}/{}.csv", self.prefix.trim_end_matches('/'), id);
        ArtifactLocation::new(location).map_err(|e| BuildError::new(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("report vanished before processing: {0}")]
    Missing(ReportId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Background consumer of queued report ids.
pub struct ReportWorker<B: ReportBuilder> {
    name: String,
    receiver: mpsc::Receiver<ReportId>,
    store: Arc<dyn ReportStore>,
    builder: Arc<B>,
}

impl<B: ReportBuilder> ReportWorker<B> {
    pub fn new(receiver: mpsc::Receiver<ReportId>, store: Arc<dyn ReportStore>, builder: Arc<B>) -> Self {
        Self {
            name: "report-worker".to_string(),
            receiver,
            store,
            builder,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Run on the current tokio runtime until every queue sender is dropped.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        tracing::info!(worker = %self.name, "report worker started");
        while let Some(id) = self.receiver.recv().await {
            let span = tracing::info_span!("report_job", worker = %self.name, report_id = %id);
            match self.process(id).instrument(span.clone()).await {
                Ok(status) => {
                    span.in_scope(|| tracing::info!(status = status.as_str(), "report finished"));
                }
                Err(e) => {
                    span.in_scope(|| tracing::error!(error = %e, "report job not recorded"));
                }
            }
        }
        tracing::info!(worker = %self.name, "report worker stopped: queue closed");
    }

    /// Build one report and record `Complete` or `Failed`.
    pub async fn process(&self, id: ReportId) -> Result<ReportStatus, WorkerError> {
        if self.store.get(id).await?.is_none() {
            return Err(WorkerError::Missing(id));
        }

        let job = match self.builder.build(id).await {
            Ok(location) => self.store.complete(id, location).await?,
            Err(e) => {
                tracing::warn!(error = %e, "report build failed");
                self.store.fail(id, e.0).await?
            }
        };
        Ok(job.status().clone())
    }
}
