//! Custom Axum extractors.

pub mod caller;

pub use caller::{CALLER_ID_HEADER, Caller, CallerContext};
