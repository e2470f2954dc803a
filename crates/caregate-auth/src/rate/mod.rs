//! Sliding-window request throttling.

pub mod guard;
pub mod token;

pub use guard::RateGuard;
pub use token::RateToken;
