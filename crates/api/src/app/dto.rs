use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
    Form,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerReportResponse {
    pub report_id: String,
}

/// Pull the raw `report_id` out of a `/get_report` request.
///
/// URL-encoded form bodies are read as forms; every other body is tried as JSON.
/// An unreadable body counts as a missing id.
pub async fn report_id_from_request(req: Request) -> Option<String> {
    if is_form(req.headers()) {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(req, &()).await.ok()?;
        return fields.get("report_id").filter(|v| !v.is_empty()).cloned();
    }

    let body = Bytes::from_request(req, &()).await.ok()?;
    report_id_from_body(&body)
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Pull the raw `report_id` out of a JSON body.
///
/// Anything that is not a JSON object, or whose `report_id` is null, false, zero
/// or empty, counts as absent. Other non-string values are stringified and left
/// for id validation to reject.
pub fn report_id_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("report_id")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}
