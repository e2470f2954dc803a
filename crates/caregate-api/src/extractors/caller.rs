//! Caller extractors: identify the caller from the `X-Caller-Id` header and
//! bind it to its session through the `Authorization: Bearer` token.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::warn;

use caregate_auth::rate::RateToken;
use caregate_core::error::AppError;
use caregate_core::types::{CallerId, SessionId};
use caregate_entity::session::Session;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller identifier.
pub const CALLER_ID_HEADER: &str = "x-caller-id";

/// The caller behind a request, before any session is bound.
///
/// Only sign-in accepts this: the password proves who the caller is.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerId);

/// The caller behind a request and the session its token unlocks.
#[derive(Debug, Clone)]
pub struct CallerContext {
    /// The caller identifier.
    pub caller: CallerId,
    /// The stored session, when the request carries its token.
    pub session: Option<Session>,
}

impl CallerContext {
    /// Budget key: the user when signed in, the caller otherwise.
    pub fn rate_token(&self) -> RateToken {
        match &self.session {
            Some(session) => RateToken::for_user(&session.user_id),
            None => RateToken::for_caller(&self.caller),
        }
    }
}

/// Reads and validates the caller header.
pub fn caller_id_from_parts(parts: &Parts) -> Result<CallerId, AppError> {
    let raw = parts
        .headers
        .get(CALLER_ID_HEADER)
        .ok_or_else(|| AppError::validation("Missing X-Caller-Id header"))?
        .to_str()
        .map_err(|_| AppError::validation("X-Caller-Id header is not valid ASCII"))?;
    CallerId::parse(raw)
}

/// Reads the bearer token, if the request carries one.
fn bearer_token(parts: &Parts) -> Result<Option<SessionId>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;
    token
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| AppError::authentication("Invalid session token"))
}

/// Resolves the caller's stored session for this request.
///
/// A caller with nothing bound passes with no session. Once a session or
/// challenge is bound, the request must present its token: the stored
/// session's token yields that session, the challenge's token yields none,
/// and anything else is refused.
pub fn authenticate(
    parts: &Parts,
    state: &AppState,
    caller: &CallerId,
) -> Result<Option<Session>, AppError> {
    let pending = state.flow.pending_token(caller);
    let session = state.store.current(caller);
    if pending.is_none() && session.is_none() {
        return Ok(None);
    }

    match (bearer_token(parts)?, session) {
        (Some(token), Some(session)) if token == session.id => Ok(Some(session)),
        (Some(token), _) if Some(token) == pending => Ok(None),
        (presented, _) => {
            warn!(caller = %caller, presented = presented.is_some(), "Session token mismatch");
            Err(AppError::authentication("Invalid or missing session token"))
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(caller_id_from_parts(parts)?))
    }
}

impl FromRequestParts<AppState> for CallerContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = caller_id_from_parts(parts)?;
        let session = authenticate(parts, state, &caller)?;
        Ok(Self { caller, session })
    }
}
