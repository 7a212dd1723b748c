//! Infrastructure layer: report storage, dispatch, worker and services.

pub mod jobs;
pub mod reports;
