//! Route definitions for the CareGate HTTP API.
//!
//! All routes are mounted under `/api` and receive `AppState` through
//! Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and request logging.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(sign_in_routes(&state))
        .merge(session_routes(&state))
        .merge(admin_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Credential and code submission, throttled with the sign-in budget.
fn sign_in_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in", post(handlers::auth::sign_in))
        .route("/auth/mfa/verify", post(handlers::auth::verify_mfa))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::throttle_sign_in,
        ))
}

/// Session endpoints, throttled with the default budget.
fn session_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/sign-out", post(handlers::auth::sign_out))
        .route("/auth/session", get(handlers::auth::session))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::throttle_default,
        ))
}

/// Admin endpoints. The admin budget is charged by the access guard.
fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/users/bulk",
        post(handlers::admin::users::bulk_create),
    )
}

/// Health check.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
