use std::sync::Arc;

use axum::{
    extract::{Extension, Request},
    response::{IntoResponse, Response},
    Json,
};

use crate::app::{
    dto::{self, TriggerReportResponse},
    errors,
    services::AppServices,
};
use crate::context::RequestOrigin;

/// Start a report and return its id immediately.
pub async fn trigger_report(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.submission.submit().await {
        Ok(id) => Json(TriggerReportResponse {
            report_id: id.to_string(),
        })
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Report status by id; the body is parsed leniently so a bad body reads as a missing id.
pub async fn get_report(Extension(services): Extension<Arc<AppServices>>, req: Request) -> Response {
    let origin = RequestOrigin::from_parts(req.uri(), req.headers());
    let raw_id = dto::report_id_from_request(req).await;

    let base = || {
        services
            .public_base_url
            .clone()
            .or_else(|| origin.base_url())
    };

    match services.status.status_with_base(raw_id.as_deref(), base).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
