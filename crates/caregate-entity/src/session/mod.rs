//! Session domain entities.

pub mod credential;
pub mod model;
pub mod scope;

pub use credential::CredentialRef;
pub use model::Session;
pub use scope::ResourceScope;
