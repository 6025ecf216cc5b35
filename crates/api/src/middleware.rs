use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use tally_admission::AdmissionLimiter;

use crate::app::errors;
use crate::context::CallerContext;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AdmissionState {
    pub limiter: Arc<AdmissionLimiter>,
}

/// Reject the request with 429 when the caller's bucket is empty. Admitted
/// requests carry a `CallerContext` for the inner layers.
pub async fn admission_middleware(
    State(state): State<AdmissionState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let caller = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| CallerContext::from_peer(*addr))
        .unwrap_or_else(CallerContext::unknown);

    if !state.limiter.allow(caller.key()) {
        warn!(remote_addr = caller.key(), "rate limit exceeded");
        return errors::json_error(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "too many requests",
        );
    }

    req.extensions_mut().insert(caller);
    next.run(req).await
}

#[derive(Clone)]
pub struct AuthState {
    pub api_key: Arc<str>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let authorized = extract_api_key(req.headers())
        .is_some_and(|key| keys_match(key.as_bytes(), state.api_key.as_bytes()));

    if !authorized {
        let remote = req
            .extensions()
            .get::<CallerContext>()
            .map(|c| c.key().to_owned())
            .unwrap_or_default();
        warn!(remote_addr = %remote, "authentication failed");
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid api key",
        );
    }

    next.run(req).await
}

fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    let key = headers.get(API_KEY_HEADER)?.to_str().ok()?.trim();
    if key.is_empty() {
        return None;
    }
    Some(key)
}

/// Comparison whose running time does not depend on where the keys differ.
fn keys_match(given: &[u8], expected: &[u8]) -> bool {
    given.ct_eq(expected).into()
}

pub async fn request_log_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let remote = req
        .extensions()
        .get::<CallerContext>()
        .map(|c| c.key().to_owned())
        .unwrap_or_default();
    let started = Instant::now();

    let res = next.run(req).await;

    info!(
        %method,
        %path,
        status = res.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        remote_addr = %remote,
        "request processed"
    );
    res
}

/// Permissive CORS: any origin, the usual verbs, JSON + credential headers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
}
