//! Rate-limit key type.

use std::fmt;

use caregate_core::AppError;
use caregate_core::types::{CallerId, UserId};

/// Identifies whose budget a request is charged against.
///
/// Authenticated requests use the user id; anonymous ones use the caller id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateToken(String);

impl RateToken {
    /// Build a token from an arbitrary key. Blank keys are rejected.
    pub fn new(key: impl Into<String>) -> Result<Self, AppError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(AppError::validation("Rate token must not be empty"));
        }
        Ok(Self(key))
    }

    /// Token charging an authenticated user.
    pub fn for_user(user_id: &UserId) -> Self {
        Self(format!("user:{user_id}"))
    }

    /// Token charging an anonymous caller.
    pub fn for_caller(caller: &CallerId) -> Self {
        Self(format!("caller:{caller}"))
    }

    /// Borrow the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
