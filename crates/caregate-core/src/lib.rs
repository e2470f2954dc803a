//! # caregate-core
//!
//! Core crate for CareGate. Contains configuration schemas, typed
//! identifiers, session domain events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other CareGate crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
