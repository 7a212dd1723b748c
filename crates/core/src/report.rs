//! The report job entity and its status lifecycle.
//!
//! ```text
//! Running ──(worker builds artifact)──▶ Complete { location }
//!    │
//!    └──────(worker gives up)─────────▶ Failed { error }
//! ```
//!
//! A job that never reached a worker is deleted rather than failed; that path is
//! owned by the submission service, not by this type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::ReportId;
use crate::location::ArtifactLocation;

/// Status of a report job.
///
/// The artifact location lives inside `Complete`, so a result can only exist
/// once the job has completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportStatus {
    Running,
    Complete { location: ArtifactLocation },
    Failed { error: String },
}

impl ReportStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportStatus::Running)
    }

    /// Client-facing status label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Running => "Running",
            ReportStatus::Complete { .. } => "Complete",
            ReportStatus::Failed { .. } => "Failed",
        }
    }
}

/// A unit of asynchronous report generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportJob {
    id: ReportId,
    status: ReportStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReportJob {
    /// A fresh `Running` job with a newly generated id.
    pub fn new() -> Self {
        Self::with_id(ReportId::new())
    }

    /// A fresh `Running` job with a caller-chosen id (tests, imports).
    pub fn with_id(id: ReportId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: ReportStatus::Running,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a job from storage.
    pub fn restore(
        id: ReportId,
        status: ReportStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn report_id(&self) -> ReportId {
        self.id
    }

    pub fn status(&self) -> &ReportStatus {
        &self.status
    }

    /// The artifact location, present only for completed jobs.
    pub fn result(&self) -> Option<&ArtifactLocation> {
        match &self.status {
            ReportStatus::Complete { location } => Some(location),
            _ => None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn mark_complete(&mut self, location: ArtifactLocation) -> DomainResult<()> {
        self.ensure_running("complete")?;
        self.status = ReportStatus::Complete { location };
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) -> DomainResult<()> {
        self.ensure_running("fail")?;
        self.status = ReportStatus::Failed { error: error.into() };
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply a terminal `outcome` (`Complete` or `Failed`) to a running job.
    pub fn finish(&mut self, outcome: ReportStatus) -> DomainResult<()> {
        match outcome {
            ReportStatus::Running => Err(DomainError::invariant(format!(
                "cannot move report {} back to Running",
                self.id
            ))),
            ReportStatus::Complete { location } => self.mark_complete(location),
            ReportStatus::Failed { error } => self.mark_failed(error),
        }
    }

    fn ensure_running(&self, action: &str) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "cannot {action} report {}: already {}",
                self.id,
                self.status.as_str()
            )));
        }
        Ok(())
    }
}

impl Default for ReportJob {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for ReportJob {
    type Id = ReportId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
