//! Provisioning request and result shapes.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One user to create.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUserRequest {
    /// Login email.
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    /// Initial password, checked against the password policy.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Role name.
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

/// Outcome for one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionResult {
    /// The email the item named, or an empty string if it named none.
    pub email: String,
    /// Whether the user was created.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl ProvisionResult {
    pub(crate) fn created(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            success: true,
            message: "User created".to_string(),
        }
    }

    pub(crate) fn failed(email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            success: false,
            message: message.into(),
        }
    }
}
