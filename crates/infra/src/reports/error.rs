use thiserror::Error;

use storewatch_core::ReportId;

use crate::jobs::StoreError;

/// Coarse error classes clients can react to differently.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fix the input and try again.
    ClientInput,
    /// The id is well-formed but unknown.
    NotFound,
    /// The queue refused the job; retrying later may help.
    Dispatch,
    /// The store is unavailable.
    Store,
}

#[derive(Debug, Error)]
pub enum ReportServiceError {
    #[error("no report id supplied")]
    MissingId,

    #[error("invalid report id: {0}")]
    InvalidId(String),

    #[error("report not found: {0}")]
    NotFound(ReportId),

    /// The report is complete but no absolute base is known for its URL.
    #[error("cannot build URL for report {0}: no public base URL or request host")]
    UnresolvableUrl(ReportId),

    /// Carries the queue's own message unchanged.
    #[error("{0}")]
    Dispatch(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReportServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportServiceError::MissingId
            | ReportServiceError::InvalidId(_)
            | ReportServiceError::UnresolvableUrl(_) => ErrorCategory::ClientInput,
            ReportServiceError::NotFound(_) => ErrorCategory::NotFound,
            ReportServiceError::Dispatch(_) => ErrorCategory::Dispatch,
            ReportServiceError::Store(_) => ErrorCategory::Store,
        }
    }
}
