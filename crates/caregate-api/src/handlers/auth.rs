//! Auth handlers: sign-in, MFA verification, sign-out, session.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use caregate_core::error::AppError;

use crate::dto::request::{SignInRequest, VerifyMfaRequest};
use crate::dto::response::{
    ApiResponse, MessageResponse, SessionStateResponse, SessionSummary, SignInResponse,
};
use crate::error::ApiError;
use crate::extractors::{Caller, CallerContext};
use crate::state::AppState;

/// POST /api/auth/sign-in
///
/// The returned `session_token` must be sent as `Authorization: Bearer` on
/// every later request from this caller.
pub async fn sign_in(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<SignInRequest>,
) -> Result<Json<ApiResponse<SignInResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid sign-in request: {e}")))?;

    let outcome = state
        .flow
        .sign_in(&caller, &req.email, &req.password)
        .await?;

    Ok(Json(ApiResponse::ok(SignInResponse {
        requires_mfa: outcome.requires_mfa,
        session_token: outcome.session_token.into_uuid(),
        state: state.flow.state(&caller),
    })))
}

/// POST /api/auth/mfa/verify
pub async fn verify_mfa(
    State(state): State<AppState>,
    ctx: CallerContext,
    Json(req): Json<VerifyMfaRequest>,
) -> Result<Json<ApiResponse<SessionStateResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid verification request: {e}")))?;

    state.flow.verify_mfa(&ctx.caller, &req.code).await?;

    let session = state.store.current(&ctx.caller);
    Ok(Json(ApiResponse::ok(SessionStateResponse {
        state: state.flow.state(&ctx.caller),
        session: session.as_ref().map(SessionSummary::from),
    })))
}

/// POST /api/auth/sign-out
pub async fn sign_out(
    State(state): State<AppState>,
    ctx: CallerContext,
) -> Json<ApiResponse<MessageResponse>> {
    state.flow.sign_out(&ctx.caller).await;

    Json(ApiResponse::ok(MessageResponse {
        message: "Signed out".to_string(),
    }))
}

/// GET /api/auth/session
pub async fn session(
    State(state): State<AppState>,
    ctx: CallerContext,
) -> Json<ApiResponse<SessionStateResponse>> {
    Json(ApiResponse::ok(SessionStateResponse {
        state: state.flow.state(&ctx.caller),
        session: ctx.session.as_ref().map(SessionSummary::from),
    }))
}
