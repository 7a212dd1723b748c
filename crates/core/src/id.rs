//! Report identifiers and client-input validation.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a report job (the only external handle to a job).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(Uuid);

impl ReportId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered, 74 random bits), so concurrent creators never
    /// need to coordinate. Prefer passing IDs explicitly in tests for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ReportId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl From<Uuid> for ReportId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ReportId> for Uuid {
    fn from(value: ReportId) -> Self {
        value.0
    }
}

impl FromStr for ReportId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s).map_err(|e| DomainError::invalid_id(format!("ReportId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Outcome of validating a client-supplied report identifier.
///
/// Purely syntactic: producing this value never touches a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportIdInput {
    /// A well-formed identifier (it may still be unknown to the store).
    Valid(ReportId),
    /// No identifier was supplied at all.
    Missing,
    /// Something was supplied but it is not a UUID; carries the parse failure.
    Malformed(String),
}

/// Validate a raw identifier as supplied by a client.
///
/// `None` and the empty string are both "missing". Anything else must parse as a
/// UUID in one of the usual textual forms (hyphenated, simple, braced or urn);
/// surrounding whitespace is not stripped.
pub fn validate_report_id(raw: Option<&str>) -> ReportIdInput {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return ReportIdInput::Missing,
    };

    match Uuid::parse_str(raw) {
        Ok(uuid) => ReportIdInput::Valid(ReportId::from_uuid(uuid)),
        Err(e) => ReportIdInput::Malformed(e.to_string()),
    }
}
