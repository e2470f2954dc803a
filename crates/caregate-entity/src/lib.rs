//! # caregate-entity
//!
//! Domain value types for CareGate. Nothing in this crate performs I/O;
//! sessions and profiles are built by the auth crate and stored in memory.

pub mod session;
pub mod user;
