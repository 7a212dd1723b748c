//! Report submission and status services.
//!
//! Both services receive their collaborators explicitly (`Arc<dyn ReportStore>`,
//! `Arc<dyn ReportQueue>`), so tests swap in doubles from `jobs::testing`.

pub mod error;
pub mod status;
pub mod submission;

pub use error::{ErrorCategory, ReportServiceError};
pub use status::{StatusService, StatusView};
pub use submission::SubmissionService;
