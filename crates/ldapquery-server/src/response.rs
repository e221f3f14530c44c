//! Response writing.
//!
//! Every body is JSON with the `application/json; charset=UTF-8` content type. Two failures are
//! special-cased: validation failures carry the bare list of violations, and a rejected method
//! carries no body at all.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use ldapquery_core::error::Error;
use ldapquery_core::trace::TraceId;
use ldapquery_core::types::{ResponseEnvelope, ResultEntry};
use serde::Serialize;
use tracing::error;

/// Content type of every JSON body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Serializes `body` and writes it with `status`.
pub fn send<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = (status, Body::from(bytes)).into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(JSON_CONTENT_TYPE),
            );
            response
        }
        Err(err) => {
            error!(error = %err, "unable to encode response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Writes the response for a failed request.
pub fn failure(err: &Error, trace_id: Option<TraceId>) -> Response {
    let status = status_of(err);
    match err {
        Error::ValidationFailed(violations) => send(status, violations),
        Error::MethodNotAllowed(_) => status.into_response(),
        _ => send(
            status,
            &ResponseEnvelope::from_error(err).with_trace_id(trace_id),
        ),
    }
}

/// Writes the response for a completed search: 200 with entries, or 404 when nothing matched.
pub fn results(entries: Vec<ResultEntry>, trace_id: TraceId) -> (StatusCode, Response) {
    let status = if entries.is_empty() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    let envelope = ResponseEnvelope::new()
        .with_trace_id(Some(trace_id))
        .with_result(entries);
    (status, send(status, &envelope))
}

/// HTTP status for an error.
#[must_use]
pub fn status_of(err: &Error) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
