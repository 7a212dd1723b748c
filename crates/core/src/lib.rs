//! `storewatch-core` — report job domain primitives.
//!
//! This crate contains **pure domain** types (no storage, queue or HTTP concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod location;
pub mod report;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{validate_report_id, ReportId, ReportIdInput};
pub use location::{ArtifactLocation, BaseUrl};
pub use report::{ReportJob, ReportStatus};
pub use value_object::ValueObject;
