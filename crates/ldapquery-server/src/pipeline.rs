//! Request pipeline for `POST /`.
//!
//! Stages run in a fixed order, each halting the request on rejection:
//!
//! 1. [`require_post`] - method gate (405, no body)
//! 2. [`resolve_client_ip`] - client IP from the peer address or `X-Forwarded-For` (500 on failure)
//! 3. [`enforce_allow_list`] - source allow-list (401)
//! 4. [`issue_trace_id`] - trace ID issuance; builds the [`RequestContext`] (500 on failure)
//!
//! Every rejection is counted in the error metric.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use ldapquery_core::error::{Error, Result};
use ldapquery_core::trace::TraceId;
use std::net::SocketAddr;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::context::{ClientIp, RequestContext};
use crate::response::{failure, status_of};
use crate::state::AppState;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Rejects every method other than POST.
pub async fn require_post(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() == Method::POST {
        return next.run(request).await;
    }

    let err = Error::MethodNotAllowed(request.method().to_string());
    debug!(method = %request.method(), "rejected request method");
    reject(&state, &err, &client_label(&request), None)
}

/// Resolves the client IP and stores it as a [`ClientIp`] extension.
pub async fn resolve_client_ip(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = peer_address(&request);

    match client_ip(peer, request.headers()) {
        Ok(ip) => {
            request.extensions_mut().insert(ClientIp(ip));
            next.run(request).await
        }
        Err(err) => {
            error!(error = %err, "unable to resolve client IP");
            reject(&state, &err, UNKNOWN_CLIENT, None)
        }
    }
}

/// Rejects clients whose IP is not in the allow-list.
pub async fn enforce_allow_list(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_label(&request);

    if state.is_allowed(&client) {
        return next.run(request).await;
    }

    let err = Error::SourceNotAllowed(client.clone());
    warn!(client_ip = %client, "rejected request from source outside the allow-list");
    reject(&state, &err, &client, None)
}

/// Issues a trace ID, attaches the [`RequestContext`] and runs the rest of the request inside a
/// span carrying both identifiers.
pub async fn issue_trace_id(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let client = client_label(&request);

    let trace_id = match state.trace_ids.issue() {
        Ok(trace_id) => trace_id,
        Err(err) => {
            error!(client_ip = %client, error = %err, "unable to generate trace ID");
            return reject(&state, &err, &client, None);
        }
    };

    let span = info_span!("query", trace_id = %trace_id, client_ip = %client);
    request
        .extensions_mut()
        .insert(RequestContext::new(client, trace_id));

    next.run(request).instrument(span).await
}

/// Client IP for a request: the first `X-Forwarded-For` entry when the header is present,
/// otherwise the peer address.
///
/// The header is trusted unconditionally.
///
/// # Errors
///
/// Returns [`Error::ClientAddressUnavailable`] when the peer address is unknown, even if the
/// header is present.
pub fn client_ip(peer: Option<SocketAddr>, headers: &HeaderMap) -> Result<String> {
    let peer = peer.ok_or_else(|| {
        Error::ClientAddressUnavailable("no remote address recorded for connection".to_string())
    })?;

    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());

    Ok(match forwarded {
        Some(value) => value.split(',').next().unwrap_or_default().trim().to_string(),
        None => peer.ip().to_string(),
    })
}

/// Counts and answers a rejected request.
pub(crate) fn reject(
    state: &AppState,
    err: &Error,
    client: &str,
    trace_id: Option<TraceId>,
) -> Response {
    let status = status_of(err);
    state.metrics.record_error(err.operation(), status, client);
    failure(err, trace_id)
}

fn peer_address(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

fn client_label(request: &Request) -> String {
    if let Some(ClientIp(ip)) = request.extensions().get::<ClientIp>() {
        return ip.clone();
    }
    peer_address(request).map_or_else(|| UNKNOWN_CLIENT.to_string(), |addr| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    fn peer(ip: IpAddr) -> Option<SocketAddr> {
        Some(SocketAddr::new(ip, 51000))
    }

    #[test]
    fn uses_peer_address_without_header() {
        let ip = client_ip(peer(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))), &HeaderMap::new());
        assert_eq!(ip.unwrap(), "10.0.0.7");
    }

    #[test]
    fn ipv6_peer_has_no_brackets_or_port() {
        let ip = client_ip(peer(IpAddr::V6(Ipv6Addr::LOCALHOST)), &HeaderMap::new());
        assert_eq!(ip.unwrap(), "::1");
    }

    #[test]
    fn forwarded_for_overrides_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_static(" 203.0.113.9 , 10.0.0.1, 10.0.0.2"),
        );
        let ip = client_ip(peer(IpAddr::V4(Ipv4Addr::LOCALHOST)), &headers);
        assert_eq!(ip.unwrap(), "203.0.113.9");
    }

    #[test]
    fn empty_forwarded_for_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(""));
        let ip = client_ip(peer(IpAddr::V4(Ipv4Addr::LOCALHOST)), &headers);
        assert_eq!(ip.unwrap(), "127.0.0.1");
    }

    #[test]
    fn missing_peer_is_an_error_even_with_header() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.9"));
        let err = client_ip(None, &headers).unwrap_err();
        assert_eq!(err.operation(), "client_ip");
        assert_eq!(err.status_code(), 500);
    }
}
