//! # caregate-api
//!
//! HTTP API layer for CareGate built on Axum.
//!
//! Provides the auth and admin endpoints, the caller extractor, rate-limit
//! and logging middleware, DTOs, and the mapping from domain errors to HTTP
//! responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, seed_users, spawn_background_tasks};
pub use error::ApiError;
pub use state::AppState;
