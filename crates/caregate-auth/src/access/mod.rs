//! Authorization of privileged actions.

pub mod guard;

pub use guard::AccessGuard;
