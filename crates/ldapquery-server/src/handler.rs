//! Search handler.
//!
//! Runs after the pipeline has admitted the request. The connection is opened before the body is
//! read, so a directory outage surfaces as a bind failure regardless of the payload.

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Extension;
use ldapquery_core::error::{Error, Result};
use ldapquery_core::query::Query;
use ldapquery_core::types::ResultEntry;
use ldapquery_directory::DirectoryConnection;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::context::RequestContext;
use crate::pipeline::reject;
use crate::response::results;
use crate::state::AppState;

/// Handles `POST /`.
pub async fn search(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    request: Request,
) -> Response {
    let started = Instant::now();

    let mut connection = match state.directory.connect().await {
        Ok(connection) => connection,
        Err(err) => return fail(&state, &context, &err),
    };

    let outcome = execute(&mut connection, request).await;
    let elapsed = started.elapsed();
    connection.close().await;

    match outcome {
        Ok(entries) => {
            debug!(entries = entries.len(), "search complete");
            let (status, response) = results(entries, context.trace_id);
            state.metrics.observe_duration(status, elapsed);
            response
        }
        Err(err) => fail(&state, &context, &err),
    }
}

async fn execute(connection: &mut DirectoryConnection, request: Request) -> Result<Vec<ResultEntry>> {
    let body = to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|err| Error::RequestUnreadable(err.to_string()))?;

    let query = Query::parse(&body)?;
    debug!(
        filter = %query.filter,
        base = %query.base,
        scope = %query.scope,
        attributes = ?query.attributes,
        "validating query"
    );

    let query = query.into_validated()?;
    connection.search(&query).await
}

fn fail(state: &AppState, context: &RequestContext, err: &Error) -> Response {
    if let Error::ValidationFailed(violations) = err {
        warn!(
            trace_id = %context.trace_id,
            client_ip = %context.client_ip,
            violations = ?violations,
            "{}",
            err.summary()
        );
    } else if err.should_log() {
        error!(
            trace_id = %context.trace_id,
            client_ip = %context.client_ip,
            error = %err,
            code = err.error_code(),
            "{}",
            err.summary()
        );
    } else {
        warn!(
            trace_id = %context.trace_id,
            client_ip = %context.client_ip,
            error = %err,
            code = err.error_code(),
            "{}",
            err.summary()
        );
    }

    reject(state, err, &context.client_ip, Some(context.trace_id))
}
