//! Admin-gated bulk user provisioning.

pub mod request;
pub mod service;

pub use request::{NewUserRequest, ProvisionResult};
pub use service::ProvisioningService;
