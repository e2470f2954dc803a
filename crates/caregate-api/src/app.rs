//! Application builder: wires state, router and middleware into an Axum
//! app, and owns the background tasks.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use caregate_auth::access::AccessGuard;
use caregate_auth::flow::{AuthFlow, FlowConfig};
use caregate_auth::mfa::MfaVerifier;
use caregate_auth::password::PasswordValidator;
use caregate_auth::provider::{IdentityProvider, InMemoryIdentityProvider, UserProvisioner};
use caregate_auth::provisioning::ProvisioningService;
use caregate_auth::rate::RateGuard;
use caregate_auth::session::SessionStore;
use caregate_core::config::AppConfig;
use caregate_core::config::identity::SeedUser;
use caregate_core::error::AppError;
use caregate_entity::session::ResourceScope;
use caregate_entity::user::{Role, RoleProfile};

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::{AppState, RateLimits};

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Wires every component around one identity provider.
pub fn build_state<P>(
    config: AppConfig,
    provider: Arc<P>,
    verifier: Arc<dyn MfaVerifier>,
) -> Result<AppState, AppError>
where
    P: IdentityProvider + UserProvisioner + 'static,
{
    config.validate()?;

    let limits = RateLimits {
        sign_in: non_zero("auth.sign_in_limit", config.auth.sign_in_limit)?,
        default: non_zero("rate_limit.default_limit", config.rate_limit.default_limit)?,
        admin: non_zero("rate_limit.admin_limit", config.rate_limit.admin_limit)?,
    };

    let store = Arc::new(SessionStore::new());
    let rate = Arc::new(RateGuard::from_config(&config.rate_limit));
    let access = AccessGuard::new(Arc::clone(&store), Arc::clone(&rate));

    let identity: Arc<dyn IdentityProvider> = provider.clone();
    let flow = Arc::new(AuthFlow::new(
        Arc::clone(&store),
        identity,
        verifier,
        FlowConfig::from_app_config(&config),
    ));

    let provisioner: Arc<dyn UserProvisioner> = provider;
    let provisioning = Arc::new(ProvisioningService::new(
        access.clone(),
        provisioner,
        PasswordValidator::new(&config.auth),
        limits.admin,
        config.provider_timeout(),
    ));

    Ok(AppState {
        config: Arc::new(config),
        store,
        flow,
        access,
        rate,
        provisioning,
        limits,
        started_at: Instant::now(),
    })
}

/// Creates the configured accounts in the in-memory provider.
pub async fn seed_users(
    provider: &InMemoryIdentityProvider,
    users: &[SeedUser],
) -> Result<usize, AppError> {
    for user in users {
        let role: Role = user.role.parse()?;
        let profile = RoleProfile::new(role, user.mfa_enrolled)
            .with_scopes(user.scopes.iter().map(|s| ResourceScope::new(s.as_str())));
        let user_id = provider.insert_user(&user.email, &user.password, profile).await?;
        info!(user_id = %user_id, email = %user.email, role = %role, "Seeded user");
    }
    Ok(users.len())
}

/// Starts the rate sweeper, the flow cleanup and the reconciler.
///
/// Every task exits once `shutdown` flips to `true` or its sender drops.
pub fn spawn_background_tasks(
    state: &AppState,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    vec![
        Arc::clone(&state.rate).spawn_sweeper(shutdown.clone()),
        Arc::clone(&state.flow).spawn_cleanup(shutdown.clone()),
        Arc::clone(&state.flow).spawn_reconciler(shutdown),
    ]
}

fn non_zero(name: &str, value: u32) -> Result<NonZeroU32, AppError> {
    NonZeroU32::new(value)
        .ok_or_else(|| AppError::configuration(format!("{name} must be greater than zero")))
}
