//! CareGate Server: access-control gateway for the care platform.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use caregate_api::{build_app, build_state, seed_users, spawn_background_tasks};
use caregate_auth::mfa::{FormatCodeVerifier, MfaVerifier};
use caregate_auth::password::PasswordHasher;
use caregate_auth::provider::InMemoryIdentityProvider;
use caregate_core::config::AppConfig;
use caregate_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("CAREGATE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CareGate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Identity provider ────────────────────────────────
    let provider = Arc::new(InMemoryIdentityProvider::new(PasswordHasher::new()));
    let seeded = seed_users(&provider, &config.identity.seed_users).await?;
    tracing::info!(users = seeded, "Identity provider ready");

    // ── Step 2: Second-factor verifier ───────────────────────────
    let verifier: Arc<dyn MfaVerifier> = Arc::new(FormatCodeVerifier::new(config.mfa.code_length));

    // ── Step 3: Application state ────────────────────────────────
    let host = config.server.host.clone();
    let port = config.server.port;
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = build_state(config, provider, verifier)?;

    // ── Step 4: Background tasks ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = spawn_background_tasks(&state, shutdown_rx);
    tracing::info!(tasks = handles.len(), "Background tasks started");

    // ── Step 5: Start HTTP server ────────────────────────────────
    let app = build_app(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("CareGate listening on http://{addr}");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 6: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");
    for handle in handles {
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Background task did not stop within the grace period");
        }
    }

    tracing::info!("CareGate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
