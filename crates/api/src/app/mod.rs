//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/queue/worker wiring from [`ApiConfig`](crate::config::ApiConfig)
//! - `routes/`: HTTP handlers
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: service error to HTTP response mapping

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: services::AppServices) -> Router {
    let services = Arc::new(services);

    Router::new()
        .route("/health", get(routes::system::health))
        .route(
            "/trigger_report",
            get(routes::reports::trigger_report).post(routes::reports::trigger_report),
        )
        .route("/get_report", post(routes::reports::get_report))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_id_middleware))
                .layer(Extension(services)),
        )
}
