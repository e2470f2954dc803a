//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field has a serde default so an empty file is valid.

pub mod app;
pub mod auth;
pub mod identity;
pub mod logging;
pub mod mfa;
pub mod rate_limit;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::AuthConfig;
use self::identity::IdentityConfig;
use self::logging::LoggingConfig;
use self::mfa::MfaConfig;
use self::rate_limit::RateLimitConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Sign-in flow settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Second-factor challenge settings.
    #[serde(default)]
    pub mfa: MfaConfig,
    /// Request throttling settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// In-memory identity provider seed data.
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `CAREGATE__`.
    pub fn load(env: &str) -> AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CAREGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would disable a guard outright.
    pub fn validate(&self) -> AppResult<()> {
        let checks: [(&str, bool); 9] = [
            ("rate_limit.interval_ms", self.rate_limit.interval_ms == 0),
            (
                "rate_limit.unique_token_capacity",
                self.rate_limit.unique_token_capacity == 0,
            ),
            ("rate_limit.default_limit", self.rate_limit.default_limit == 0),
            ("rate_limit.admin_limit", self.rate_limit.admin_limit == 0),
            ("auth.sign_in_limit", self.auth.sign_in_limit == 0),
            (
                "auth.cleanup_interval_seconds",
                self.auth.cleanup_interval_seconds == 0,
            ),
            ("mfa.challenge_ttl_seconds", self.mfa.challenge_ttl_seconds == 0),
            ("mfa.max_attempts", self.mfa.max_attempts == 0),
            ("mfa.code_length", self.mfa.code_length == 0),
        ];

        if let Some((name, _)) = checks.iter().find(|(_, zero)| *zero) {
            return Err(AppError::configuration(format!("{name} must be greater than zero")));
        }
        if self.auth.provider_timeout_ms == 0 {
            return Err(AppError::configuration(
                "auth.provider_timeout_ms must be greater than zero",
            ));
        }
        if self.auth.password_min_score > 4 {
            return Err(AppError::configuration(
                "auth.password_min_score must be between 0 and 4",
            ));
        }
        Ok(())
    }

    /// Upper bound for a single identity-provider call.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.auth.provider_timeout_ms)
    }

    /// Lifetime of a pending MFA challenge.
    pub fn challenge_ttl(&self) -> Duration {
        Duration::from_secs(self.mfa.challenge_ttl_seconds)
    }
}
