//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: ledger service + admission limiter wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and mapping to core types
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router with fresh services.
pub fn build_app(config: &ApiConfig) -> Router {
    let services = Arc::new(services::build_services(config));
    build_app_with(services, config)
}

/// Build the router around existing services (shared with background tasks).
///
/// Layer order, outermost first: admission, CORS, API key, request log.
/// `/health` bypasses all of them.
pub fn build_app_with(services: Arc<AppServices>, config: &ApiConfig) -> Router {
    let admission_state = middleware::AdmissionState {
        limiter: Arc::clone(&services.limiter),
    };
    let auth_state = middleware::AuthState {
        api_key: Arc::from(config.api_key.as_str()),
    };

    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::request_log_middleware))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ))
        .layer(middleware::cors_layer())
        .layer(axum::middleware::from_fn_with_state(
            admission_state,
            middleware::admission_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}

pub use services::AppServices;
