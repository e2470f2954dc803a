//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Sign-in request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    /// Login email.
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Second-factor verification body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyMfaRequest {
    /// The one-time code.
    #[validate(length(min = 1, max = 16, message = "Code must be 1 to 16 characters"))]
    pub code: String,
}

/// Bulk user creation body.
///
/// Items are kept as raw JSON so one malformed entry fails alone.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkCreateUsersRequest {
    /// Users to create.
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 users per batch"))]
    pub users: Vec<serde_json::Value>,
}
