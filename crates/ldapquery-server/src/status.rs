//! Liveness and metrics endpoints.

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use ldapquery_core::types::ResponseEnvelope;
use prometheus::TEXT_FORMAT;
use tracing::error;

use crate::response::send;
use crate::state::AppState;

/// Handles `GET /status`.
pub async fn status() -> Response {
    send(StatusCode::OK, &ResponseEnvelope::message("ok"))
}

/// Handles `GET /metrics`.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(text) => {
            let mut response = (StatusCode::OK, text).into_response();
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
            response
        }
        Err(err) => {
            error!(error = %err, "unable to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
