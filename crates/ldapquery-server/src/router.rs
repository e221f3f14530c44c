//! Route table.

use axum::middleware;
use axum::routing::{any, get};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handler::search;
use crate::pipeline::{enforce_allow_list, issue_trace_id, require_post, resolve_client_ip};
use crate::state::AppState;
use crate::status::{metrics, status};

/// Builds the router.
///
/// `/metrics` and `/status` bypass the pipeline; every other path is a search. The router must be
/// served with connect info (`into_make_service_with_connect_info::<SocketAddr>`) so the
/// pipeline can see the peer address.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(search))
        .route("/{*path}", any(search))
        .route_layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), require_post))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    resolve_client_ip,
                ))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    enforce_allow_list,
                ))
                .layer(middleware::from_fn_with_state(state.clone(), issue_trace_id)),
        )
        .route("/metrics", get(metrics))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
