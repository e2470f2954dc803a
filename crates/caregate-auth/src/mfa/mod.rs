//! Second-factor verification boundary.

pub mod format;

use async_trait::async_trait;
use caregate_core::types::UserId;

use crate::error::ProviderError;

pub use format::FormatCodeVerifier;

/// Decides whether a second-factor code is valid for a user.
///
/// `Ok(false)` is a wrong code and counts against the challenge. `Err` is a
/// verifier fault and does not.
#[async_trait]
pub trait MfaVerifier: Send + Sync + std::fmt::Debug {
    /// Checks `code` for `user_id`.
    async fn verify(&self, user_id: &UserId, code: &str) -> Result<bool, ProviderError>;
}
