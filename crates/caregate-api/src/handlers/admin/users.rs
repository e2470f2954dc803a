//! Admin user management handlers.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use caregate_auth::error::AccessDenied;
use caregate_core::error::AppError;

use crate::dto::request::BulkCreateUsersRequest;
use crate::dto::response::{ApiResponse, BulkCreateUsersResponse};
use crate::error::ApiError;
use crate::extractors::CallerContext;
use crate::state::AppState;

/// POST /api/admin/users/bulk
///
/// Authorization and the admin budget are enforced by the provisioning
/// service before any item is looked at.
pub async fn bulk_create(
    State(state): State<AppState>,
    ctx: CallerContext,
    Json(req): Json<BulkCreateUsersRequest>,
) -> Result<Json<ApiResponse<BulkCreateUsersResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid bulk request: {e}")))?;
    // A pending challenge's token does not unlock the stored session.
    if ctx.session.is_none() {
        return Err(AccessDenied::Unauthenticated.into());
    }

    let results = state
        .provisioning
        .provision(&ctx.caller, &ctx.rate_token(), req.users)
        .await?;

    let created = results.iter().filter(|r| r.success).count();
    Ok(Json(ApiResponse::ok(BulkCreateUsersResponse {
        created,
        failed: results.len() - created,
        results,
    })))
}
