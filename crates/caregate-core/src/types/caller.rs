//! Caller identity.
//!
//! A caller is whatever drives a sequence of authentication calls: a browser
//! tab, a device, or a service client. Callers identify themselves with an
//! opaque identifier that is stable across requests. Session state, pending
//! MFA challenges, and anonymous rate budgets are all keyed by it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Maximum accepted length of a caller identifier.
pub const MAX_CALLER_ID_LEN: usize = 128;

/// Opaque, caller-supplied identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CallerId(String);

impl CallerId {
    /// Validates and wraps a caller identifier.
    ///
    /// Identifiers must be non-empty, at most [`MAX_CALLER_ID_LEN`] bytes,
    /// and consist of visible ASCII characters only.
    pub fn parse(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("Caller identifier must not be empty"));
        }
        if trimmed.len() > MAX_CALLER_ID_LEN {
            return Err(AppError::validation(format!(
                "Caller identifier must be at most {MAX_CALLER_ID_LEN} characters"
            )));
        }
        if !trimmed.chars().all(|c| c.is_ascii_graphic()) {
            return Err(AppError::validation(
                "Caller identifier must contain visible ASCII characters only",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CallerId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CallerId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CallerId> for String {
    fn from(id: CallerId) -> Self {
        id.0
    }
}
