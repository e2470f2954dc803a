//! Identity provider boundary.
//!
//! The provider owns credential verification, user profiles, and the
//! stream of session changes made outside this process. The flow only
//! sees it through these traits.

pub mod memory;
pub mod notification;

use async_trait::async_trait;
use caregate_core::types::UserId;
use caregate_entity::session::CredentialRef;
use caregate_entity::user::{Role, RoleProfile};
use tokio::sync::broadcast;

use crate::error::ProviderError;

pub use memory::InMemoryIdentityProvider;
pub use notification::{SessionChange, SessionNotification};

/// What the provider returns for a successful credential check.
#[derive(Debug, Clone)]
pub struct VerifiedCredentials {
    /// The authenticated user.
    pub user_id: UserId,
    /// The user's canonical email.
    pub email: String,
    /// Provider credential backing the new session.
    pub credential: CredentialRef,
}

/// Verifies credentials and serves role profiles.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Checks an email and password pair.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedCredentials, ProviderError>;

    /// Fetches the current role profile of a user.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<RoleProfile, ProviderError>;

    /// Subscribes to session changes made outside this process.
    ///
    /// Dropping the receiver unsubscribes.
    fn subscribe_session_changes(&self) -> broadcast::Receiver<SessionNotification>;

    /// Asks the provider to invalidate a credential.
    async fn revoke_session(&self, _credential: &CredentialRef) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Creates user accounts.
#[async_trait]
pub trait UserProvisioner: Send + Sync + std::fmt::Debug {
    /// Creates a user with the given role and returns its id.
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<UserId, ProviderError>;
}
