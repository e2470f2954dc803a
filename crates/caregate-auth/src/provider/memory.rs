//! In-memory identity provider for single-node deployments and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use caregate_core::error::AppError;
use caregate_core::types::UserId;
use caregate_entity::session::CredentialRef;
use caregate_entity::user::{Role, RoleProfile};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ProviderError;
use crate::password::PasswordHasher;

use super::{IdentityProvider, SessionNotification, UserProvisioner, VerifiedCredentials};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct UserRecord {
    user_id: UserId,
    email: String,
    password_hash: String,
}

/// Keeps accounts, profiles, and issued credentials in memory.
///
/// Passwords are stored as Argon2id hashes. The availability switch lets
/// callers simulate an outage.
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    /// Lowercased email → account.
    users: RwLock<HashMap<String, UserRecord>>,
    /// User → current profile.
    profiles: RwLock<HashMap<UserId, RoleProfile>>,
    /// Credentials issued and not yet revoked.
    credentials: RwLock<HashMap<CredentialRef, UserId>>,
    /// Fan-out of provider-side session changes.
    changes: broadcast::Sender<SessionNotification>,
    /// Whether the provider answers requests.
    available: AtomicBool,
    hasher: PasswordHasher,
}

impl InMemoryIdentityProvider {
    /// Creates an empty provider using the given hasher.
    pub fn new(hasher: PasswordHasher) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            users: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            credentials: RwLock::new(HashMap::new()),
            changes,
            available: AtomicBool::new(true),
            hasher,
        }
    }

    /// Adds an account with the given profile.
    pub async fn insert_user(
        &self,
        email: &str,
        password: &str,
        profile: RoleProfile,
    ) -> Result<UserId, AppError> {
        let key = normalize(email);
        let password_hash = self.hasher.hash_password(password)?;

        let mut users = self.users.write().await;
        if users.contains_key(&key) {
            return Err(AppError::conflict(format!("User '{key}' already exists")));
        }

        let user_id = UserId::new();
        users.insert(
            key.clone(),
            UserRecord {
                user_id,
                email: key,
                password_hash,
            },
        );
        drop(users);

        self.profiles.write().await.insert(user_id, profile);
        Ok(user_id)
    }

    /// Replaces a user's profile.
    pub async fn set_profile(&self, user_id: UserId, profile: RoleProfile) {
        self.profiles.write().await.insert(user_id, profile);
    }

    /// Drops a user's profile so that profile lookups fail.
    pub async fn remove_profile(&self, user_id: &UserId) {
        self.profiles.write().await.remove(user_id);
    }

    /// Issues a fresh credential for a user, as a provider-side refresh would.
    pub async fn issue_credential(&self, user_id: UserId) -> CredentialRef {
        let credential = CredentialRef::new(format!("cred_{}", Uuid::new_v4().simple()));
        self.credentials
            .write()
            .await
            .insert(credential.clone(), user_id);
        credential
    }

    /// Whether a credential was issued and not revoked.
    pub async fn is_credential_active(&self, credential: &CredentialRef) -> bool {
        self.credentials.read().await.contains_key(credential)
    }

    /// Number of unrevoked credentials held by a user.
    pub async fn active_credentials(&self, user_id: UserId) -> usize {
        self.credentials
            .read()
            .await
            .values()
            .filter(|owner| **owner == user_id)
            .count()
    }

    /// Broadcasts a session change. Returns how many subscribers got it.
    pub fn publish(&self, notification: SessionNotification) -> usize {
        self.changes.send(notification).unwrap_or(0)
    }

    /// Turns the provider on or off.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        if available {
            info!("Identity provider back online");
        } else {
            warn!("Identity provider marked unavailable");
        }
    }

    fn ensure_available(&self) -> Result<(), ProviderError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProviderError::Unavailable(
                "identity provider offline".to_string(),
            ))
        }
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new(PasswordHasher::default())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedCredentials, ProviderError> {
        self.ensure_available()?;

        let record = self.users.read().await.get(&normalize(email)).cloned();
        let Some(record) = record else {
            // Unknown emails pay the same Argon2 cost as a wrong password.
            let _ = self.hasher.hash_password(password);
            return Err(ProviderError::InvalidCredentials);
        };

        let matches = self
            .hasher
            .verify_password(password, &record.password_hash)
            .map_err(|e| ProviderError::Unavailable(e.message))?;
        if !matches {
            return Err(ProviderError::InvalidCredentials);
        }

        let credential = self.issue_credential(record.user_id).await;
        debug!(user_id = %record.user_id, credential = %credential.fingerprint(), "Credential issued");

        Ok(VerifiedCredentials {
            user_id: record.user_id,
            email: record.email,
            credential,
        })
    }

    async fn fetch_profile(&self, user_id: &UserId) -> Result<RoleProfile, ProviderError> {
        self.ensure_available()?;
        self.profiles
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    fn subscribe_session_changes(&self) -> broadcast::Receiver<SessionNotification> {
        self.changes.subscribe()
    }

    async fn revoke_session(&self, credential: &CredentialRef) -> Result<(), ProviderError> {
        self.ensure_available()?;
        self.credentials.write().await.remove(credential);
        Ok(())
    }
}

#[async_trait]
impl UserProvisioner for InMemoryIdentityProvider {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<UserId, ProviderError> {
        self.ensure_available()?;

        if self.users.read().await.contains_key(&normalize(email)) {
            return Err(ProviderError::Rejected(
                "A user with this email already exists".to_string(),
            ));
        }

        self.insert_user(email, password, RoleProfile::new(role, false))
            .await
            .map_err(|e| ProviderError::Rejected(e.message))
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}
