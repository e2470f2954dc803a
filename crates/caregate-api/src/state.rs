//! Application state shared across all handlers and middleware.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use caregate_auth::access::AccessGuard;
use caregate_auth::flow::AuthFlow;
use caregate_auth::provisioning::ProvisioningService;
use caregate_auth::rate::RateGuard;
use caregate_auth::session::SessionStore;
use caregate_core::config::AppConfig;

/// Per-route request budgets, validated at startup.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    /// Budget for sign-in and MFA verification.
    pub sign_in: NonZeroU32,
    /// Budget for ordinary authenticated endpoints.
    pub default: NonZeroU32,
    /// Budget for admin endpoints.
    pub admin: NonZeroU32,
}

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped or cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Per-caller session state
    pub store: Arc<SessionStore>,
    /// Sign-in state machine
    pub flow: Arc<AuthFlow>,
    /// Authorization entry point
    pub access: AccessGuard,
    /// Request throttling
    pub rate: Arc<RateGuard>,
    /// Admin bulk user creation
    pub provisioning: Arc<ProvisioningService>,
    /// Route budgets
    pub limits: RateLimits,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}
