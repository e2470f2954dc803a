//! Domain events emitted by CareGate operations.
//!
//! Session events are delivered to `SessionStore` subscribers whenever the
//! observable session state of a caller changes.

pub mod session;

pub use session::{ClearReason, SessionEvent};
