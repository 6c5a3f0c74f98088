//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database reachable)
//!
//! # Themes
//! POST /api/themes/create      - Create a theme from an uploaded archive
//! POST /api/themes/update      - Rename a theme
//! POST /api/themes/files       - Upsert files into a theme
//! POST /api/themes/delete      - Delete a theme
//! GET  /api/themes/status      - Processing status (?shop=&themeId=)
//!
//! # Files
//! POST /api/files/upload       - Stage and upload a base64 archive
//! ```
//!
//! Every JSON endpoint answers failures as `{"error": ..., "userErrors"?: [...]}`
//! with the status from [`DeployError::status_code`].

pub mod files;
pub mod health;
pub mod themes;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::DeployError;
use crate::state::AppState;

/// JSON extractor and response whose rejections are [`DeployError::Input`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(DeployError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query-string extractor whose rejections are [`DeployError::Input`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(DeployError))]
pub struct ApiQuery<T>(pub T);

/// All routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(themes::router())
        .merge(files::router())
}

/// The application router with request tracing, bound to `state`.
pub fn router(state: AppState) -> Router {
    routes()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
