//! Per-caller session state.

pub mod store;
pub mod subscription;

pub use store::SessionStore;
pub use subscription::{SessionListener, Subscription};
