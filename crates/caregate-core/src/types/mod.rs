//! Shared value types.

pub mod caller;
pub mod id;

pub use caller::CallerId;
pub use id::{SessionId, UserId};
