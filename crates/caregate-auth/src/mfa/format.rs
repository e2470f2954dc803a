//! Development verifier that only checks the shape of a code.

use async_trait::async_trait;
use caregate_core::types::UserId;
use tracing::warn;

use crate::error::ProviderError;

use super::MfaVerifier;

/// Accepts any code made of exactly `digits` ASCII digits.
///
/// This provides no security. It exists so the challenge flow can be run
/// end to end without a real TOTP or SMS backend.
#[derive(Debug, Clone)]
pub struct FormatCodeVerifier {
    digits: usize,
}

impl FormatCodeVerifier {
    /// Creates the verifier and logs that it is not for production use.
    pub fn new(digits: usize) -> Self {
        warn!(
            digits,
            "Format-only MFA verifier in use; any well-formed code is accepted"
        );
        Self { digits }
    }
}

#[async_trait]
impl MfaVerifier for FormatCodeVerifier {
    async fn verify(&self, _user_id: &UserId, code: &str) -> Result<bool, ProviderError> {
        Ok(code.len() == self.digits && code.bytes().all(|b| b.is_ascii_digit()))
    }
}
