//! Report job storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use storewatch_core::{ArtifactLocation, DomainError, Entity, ReportId, ReportJob, ReportStatus};

/// Report job store abstraction.
///
/// The single source of truth for job status. Every method is a single-record
/// operation; callers see either a fully initialised job or no job at all.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Create a new `Running` job with a freshly generated id.
    async fn create(&self) -> Result<ReportJob, StoreError>;

    /// Get a job by ID.
    async fn get(&self, id: ReportId) -> Result<Option<ReportJob>, StoreError>;

    /// Overwrite an existing job. Fails with `NotFound` if the record is gone.
    async fn update(&self, job: &ReportJob) -> Result<(), StoreError>;

    /// Remove a job. Removing an absent job is not an error.
    async fn delete(&self, id: ReportId) -> Result<(), StoreError>;

    /// Number of stored jobs.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Move a `Running` job to a terminal `outcome` as one atomic step.
    ///
    /// Of several concurrent calls for the same id exactly one succeeds; the
    /// others get `InvalidTransition`.
    async fn finish(&self, id: ReportId, outcome: ReportStatus) -> Result<ReportJob, StoreError>;

    /// Worker-side transition `Running -> Complete`.
    async fn complete(&self, id: ReportId, location: ArtifactLocation) -> Result<ReportJob, StoreError> {
        self.finish(id, ReportStatus::Complete { location }).await
    }

    /// Worker-side transition `Running -> Failed`.
    async fn fail(&self, id: ReportId, error: String) -> Result<ReportJob, StoreError> {
        self.finish(id, ReportStatus::Failed { error }).await
    }
}

/// Report store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("report not found: {0}")]
    NotFound(ReportId),
    #[error("report already exists: {0}")]
    AlreadyExists(ReportId),
    #[error(transparent)]
    InvalidTransition(#[from] DomainError),
    #[error("storage error: {0}")]
    Storage(String),
}

/// In-memory report store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    jobs: RwLock<HashMap<ReportId, ReportJob>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seed a job as-is (fixtures, or a worker that lives in-process).
    pub async fn insert(&self, job: ReportJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let id = *job.id();
        if jobs.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        jobs.insert(id, job);
        Ok(())
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create(&self) -> Result<ReportJob, StoreError> {
        let job = ReportJob::new();
        self.insert(job.clone()).await?;
        Ok(job)
    }

    async fn get(&self, id: ReportId) -> Result<Option<ReportJob>, StoreError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update(&self, job: &ReportJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job.id()) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(*job.id())),
        }
    }

    async fn finish(&self, id: ReportId, outcome: ReportStatus) -> Result<ReportJob, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        job.finish(outcome)?;
        Ok(job.clone())
    }

    async fn delete(&self, id: ReportId) -> Result<(), StoreError> {
        self.jobs.write().await.remove(&id);
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.jobs.read().await.len())
    }
}

#[async_trait]
impl<T: ReportStore + ?Sized> ReportStore for Arc<T> {
    async fn create(&self) -> Result<ReportJob, StoreError> {
        (**self).create().await
    }

    async fn get(&self, id: ReportId) -> Result<Option<ReportJob>, StoreError> {
        (**self).get(id).await
    }

    async fn update(&self, job: &ReportJob) -> Result<(), StoreError> {
        (**self).update(job).await
    }

    async fn finish(&self, id: ReportId, outcome: ReportStatus) -> Result<ReportJob, StoreError> {
        (**self).finish(id, outcome).await
    }

    async fn delete(&self, id: ReportId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        (**self).count().await
    }
}
