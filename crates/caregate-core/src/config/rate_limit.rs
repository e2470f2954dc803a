//! Request throttling configuration.

use serde::{Deserialize, Serialize};

/// Sliding-window throttle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Length of the sliding window in milliseconds. Also the sweep period.
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    /// Maximum number of distinct tokens tracked at once.
    #[serde(default = "default_capacity")]
    pub unique_token_capacity: usize,
    /// Requests per interval for ordinary privileged actions.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Requests per interval for admin actions such as bulk provisioning.
    #[serde(default = "default_admin_limit")]
    pub admin_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            unique_token_capacity: default_capacity(),
            default_limit: default_limit(),
            admin_limit: default_admin_limit(),
        }
    }
}

fn default_interval() -> u64 {
    60_000
}

fn default_capacity() -> usize {
    500
}

fn default_limit() -> u32 {
    60
}

fn default_admin_limit() -> u32 {
    10
}
