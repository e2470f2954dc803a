//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use caregate_auth::flow::AuthState;
use caregate_auth::provisioning::ProvisionResult;
use caregate_entity::session::Session;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Sign-in result.
#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    /// Whether `/auth/mfa/verify` must be called next.
    pub requires_mfa: bool,
    /// Bearer token for later requests.
    pub session_token: Uuid,
    /// The caller's state after the call.
    pub state: AuthState,
}

/// Session summary, without the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session ID.
    pub session_id: Uuid,
    /// User ID.
    pub user_id: Uuid,
    /// Email.
    pub email: String,
    /// Role.
    pub role: String,
    /// Whether a second factor is required.
    pub mfa_required: bool,
    /// Whether the second factor was passed.
    pub mfa_satisfied: bool,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.into_uuid(),
            user_id: session.user_id.into_uuid(),
            email: session.email.clone(),
            role: session.role.to_string(),
            mfa_required: session.mfa_required,
            mfa_satisfied: session.mfa_satisfied,
            scopes: session.scopes.iter().map(|s| s.to_string()).collect(),
            created_at: session.created_at,
        }
    }
}

/// The caller's state and session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStateResponse {
    /// Current state.
    pub state: AuthState,
    /// Current session, if any.
    pub session: Option<SessionSummary>,
}

/// Bulk user creation result.
#[derive(Debug, Clone, Serialize)]
pub struct BulkCreateUsersResponse {
    /// Items created.
    pub created: usize,
    /// Items that failed.
    pub failed: usize,
    /// Per-item outcomes, in request order.
    pub results: Vec<ProvisionResult>,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: u64,
}
