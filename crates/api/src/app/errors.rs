use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use storewatch_infra::reports::ReportServiceError;

pub const MISSING_INPUT_MESSAGE: &str = "No Valid inputs";
pub const INVALID_ID_MESSAGE: &str = "Invalid UUID format provided.";
pub const NOT_FOUND_DETAIL: &str = "Not found.";

pub fn service_error_to_response(err: ReportServiceError) -> Response {
    match err {
        ReportServiceError::MissingId => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": MISSING_INPUT_MESSAGE,
                "input parameter": { "report_id": "" },
            })),
        )
            .into_response(),
        ReportServiceError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, INVALID_ID_MESSAGE),
        ReportServiceError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "detail": NOT_FOUND_DETAIL })),
        )
            .into_response(),
        e @ ReportServiceError::UnresolvableUrl(_) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
        ReportServiceError::Dispatch(reason) => json_error(StatusCode::INTERNAL_SERVER_ERROR, reason),
        ReportServiceError::Store(e) => {
            tracing::error!(error = %e, "report store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}
