//! Authentication flow configuration.

use serde::{Deserialize, Serialize};

/// Settings for the sign-in flow and its housekeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Upper bound for any single identity-provider call, in milliseconds.
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_ms: u64,
    /// How often expired challenges and idle caller state are purged.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
    /// How long an empty caller slot keeps its reconciliation marker.
    #[serde(default = "default_marker_retention")]
    pub marker_retention_seconds: u64,
    /// Minimum password length accepted when provisioning users.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Minimum zxcvbn score (0-4) accepted when provisioning users.
    #[serde(default = "default_password_score")]
    pub password_min_score: u8,
    /// Sign-in attempts a single caller may make per rate interval.
    #[serde(default = "default_sign_in_limit")]
    pub sign_in_limit: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: default_provider_timeout(),
            cleanup_interval_seconds: default_cleanup_interval(),
            marker_retention_seconds: default_marker_retention(),
            password_min_length: default_password_min(),
            password_min_score: default_password_score(),
            sign_in_limit: default_sign_in_limit(),
        }
    }
}

fn default_provider_timeout() -> u64 {
    10_000
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_marker_retention() -> u64 {
    600
}

fn default_password_min() -> usize {
    8
}

fn default_password_score() -> u8 {
    3
}

fn default_sign_in_limit() -> u32 {
    10
}
