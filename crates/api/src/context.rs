use axum::http::{header, HeaderMap, Uri};

use storewatch_core::BaseUrl;

/// Where a request was addressed to, as seen by the client.
///
/// Used to turn stored artifact paths into absolute URLs when no
/// `PUBLIC_BASE_URL` is configured. Honors `X-Forwarded-Proto` from a
/// terminating proxy. The host comes from `Host`, or from the URI authority for
/// HTTP/2 and absolute-form requests that carry no `Host` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    scheme: String,
    host: Option<String>,
}

impl RequestOrigin {
    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .or(uri.scheme_str())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| v == "http" || v == "https")
            .unwrap_or_else(|| "http".to_string());

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| uri.authority().map(|a| a.as_str().to_string()));

        Self { scheme, host }
    }

    /// Absolute base for this request, if a usable host is known.
    pub fn base_url(&self) -> Option<BaseUrl> {
        let host = self.host.as_deref()?;
        BaseUrl::from_origin(&self.scheme, host).ok()
    }
}
