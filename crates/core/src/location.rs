//! Artifact locations and the public base they are resolved against.
//!
//! Workers record where a finished report lives, usually as a storage-relative
//! path such as `/files/r1.csv`. Clients must receive an absolute URL, so the
//! status path resolves the stored location against a [`BaseUrl`].

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Where a completed report artifact can be fetched from.
///
/// Either a path relative to the public base (`/files/r1.csv`, `files/r1.csv`)
/// or an already-absolute URL (`https://cdn.example.com/r1.csv`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactLocation(String);

impl ArtifactLocation {
    pub fn new(location: impl Into<String>) -> DomainResult<Self> {
        let location = location.into();
        if location.trim().is_empty() {
            return Err(DomainError::validation("artifact location must not be empty"));
        }
        Ok(Self(location))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the location already carries a URL scheme.
    pub fn is_absolute(&self) -> bool {
        has_scheme(&self.0)
    }

    /// Resolve against `base`; absolute locations are returned unchanged.
    pub fn resolve(&self, base: &BaseUrl) -> String {
        if self.is_absolute() {
            return self.0.clone();
        }
        format!("{}/{}", base.as_str(), self.0.trim_start_matches('/'))
    }
}

impl ValueObject for ArtifactLocation {}

impl TryFrom<String> for ArtifactLocation {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArtifactLocation> for String {
    fn from(value: ArtifactLocation) -> Self {
        value.0
    }
}

impl core::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute `http`/`https` prefix that relative artifact locations hang off.
///
/// Stored without a trailing slash. May carry a path prefix
/// (`https://example.com/media`), but never a query or fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let raw = raw.trim();
        let rest = raw
            .strip_prefix("http://")
            .or_else(|| raw.strip_prefix("https://"))
            .ok_or_else(|| DomainError::validation(format!("base url must start with http:// or https://: {raw}")))?;

        let host = rest.split('/').next().unwrap_or_default();
        if host.is_empty() {
            return Err(DomainError::validation(format!("base url has no host: {raw}")));
        }
        if rest.contains(['?', '#']) {
            return Err(DomainError::validation(format!(
                "base url must not carry a query or fragment: {raw}"
            )));
        }

        Ok(Self(raw.trim_end_matches('/').to_string()))
    }

    /// Build a base from a request origin (`scheme` + `Host` header value).
    pub fn from_origin(scheme: &str, host: &str) -> DomainResult<Self> {
        Self::parse(&format!("{scheme}://{host}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for BaseUrl {}

impl core::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

fn has_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
