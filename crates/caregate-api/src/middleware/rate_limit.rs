//! Per-caller request throttling at the HTTP boundary.

use std::num::NonZeroU32;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use caregate_auth::rate::{RateGuard, RateToken};
use tracing::warn;

use crate::error::ApiError;
use crate::extractors::caller::{authenticate, caller_id_from_parts};
use crate::state::AppState;

/// Charges one request to `token`, or fails with `429 Too Many Requests`
/// and a `Retry-After` header.
pub fn enforce(guard: &RateGuard, limit: NonZeroU32, token: &RateToken) -> Result<(), ApiError> {
    guard.check(limit, token).map_err(|exceeded| {
        warn!(token = %token, retry_after_ms = exceeded.retry_after.as_millis() as u64, "Request throttled");
        ApiError::from(exceeded)
    })
}

/// Throttles sign-in and MFA verification with `auth.sign_in_limit`.
pub async fn throttle_sign_in(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state.limits.sign_in;
    throttle(&state, limit, request, next).await
}

/// Throttles ordinary endpoints with `rate_limit.default_limit`.
pub async fn throttle_default(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state.limits.default;
    throttle(&state, limit, request, next).await
}

async fn throttle(state: &AppState, limit: NonZeroU32, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let caller = match caller_id_from_parts(&parts) {
        Ok(caller) => caller,
        Err(e) => return ApiError::from(e).into_response(),
    };

    // A request that does not carry the session's token is charged to the
    // caller, never to the signed-in user.
    let token = match authenticate(&parts, state, &caller) {
        Ok(Some(session)) => RateToken::for_user(&session.user_id),
        _ => RateToken::for_caller(&caller),
    };
    if let Err(e) = enforce(&state.rate, limit, &token) {
        return e.into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}
