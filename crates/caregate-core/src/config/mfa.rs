//! Second-factor challenge configuration.

use serde::{Deserialize, Serialize};

/// Lifetime and retry budget of pending MFA challenges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaConfig {
    /// Seconds a pending challenge stays valid.
    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl_seconds: u64,
    /// Failed verifications allowed before the challenge is discarded.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Number of digits expected by the format-only verifier.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

impl Default for MfaConfig {
    fn default() -> Self {
        Self {
            challenge_ttl_seconds: default_challenge_ttl(),
            max_attempts: default_max_attempts(),
            code_length: default_code_length(),
        }
    }
}

fn default_challenge_ttl() -> u64 {
    5 * 60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_code_length() -> usize {
    6
}
