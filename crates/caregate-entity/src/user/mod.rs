//! User domain entities.

pub mod profile;
pub mod role;

pub use profile::RoleProfile;
pub use role::Role;
