//! Sign-in state machine.
//!
//! A caller moves `Anonymous → Authenticating → {MfaPending, Authenticated}`
//! and `MfaPending → {Authenticated, Anonymous}`. Every explicit operation
//! and every provider notification for a caller runs under that caller's
//! gate, so there is a single writer per caller at any time.

pub mod challenge;
pub mod cleanup;
pub mod reconcile;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use caregate_core::config::AppConfig;
use caregate_core::events::ClearReason;
use caregate_core::types::{CallerId, SessionId};
use caregate_entity::session::{CredentialRef, Session};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::error::{AuthError, ChallengeError, ProviderError};
use crate::mfa::MfaVerifier;
use crate::provider::IdentityProvider;
use crate::session::SessionStore;

pub use challenge::PendingChallenge;
pub use cleanup::CleanupReport;
pub use reconcile::ReconcileOutcome;

/// Where a caller currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No session and no challenge.
    Anonymous,
    /// A sign-in is in flight.
    Authenticating,
    /// Waiting for the second factor.
    MfaPending,
    /// A usable session is stored.
    Authenticated,
}

/// Result of a successful credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignInOutcome {
    /// Whether `verify_mfa` must be called before the session is usable.
    pub requires_mfa: bool,
    /// Bearer token binding later requests to this sign-in.
    pub session_token: SessionId,
}

/// Timing and retry settings of the flow.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Upper bound for any single provider or verifier call.
    pub provider_timeout: Duration,
    /// Lifetime of a pending challenge.
    pub challenge_ttl: Duration,
    /// Failed codes allowed per challenge.
    pub max_attempts: u32,
    /// How long an empty store slot keeps its marker.
    pub marker_retention: Duration,
    /// Period of the cleanup task.
    pub cleanup_interval: Duration,
}

impl FlowConfig {
    /// Derives the flow settings from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            provider_timeout: config.provider_timeout(),
            challenge_ttl: config.challenge_ttl(),
            max_attempts: config.mfa.max_attempts.max(1),
            marker_retention: Duration::from_secs(config.auth.marker_retention_seconds),
            cleanup_interval: Duration::from_secs(config.auth.cleanup_interval_seconds.max(1)),
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// Per-caller serialization point.
#[derive(Debug, Default)]
pub(crate) struct CallerGate {
    lock: Mutex<()>,
    authenticating: AtomicBool,
}

/// Raises the gate's "authenticating" flag for the lifetime of the guard.
struct Authenticating<'a>(&'a AtomicBool);

impl<'a> Authenticating<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for Authenticating<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives sign-in, second-factor verification, sign-out, and
/// reconciliation against the identity provider.
pub struct AuthFlow {
    store: Arc<SessionStore>,
    provider: Arc<dyn IdentityProvider>,
    verifier: Arc<dyn MfaVerifier>,
    gates: DashMap<CallerId, Arc<CallerGate>>,
    pending: DashMap<CallerId, PendingChallenge>,
    /// Callers whose last challenge lapsed, and when it was dropped.
    expired: DashMap<CallerId, Instant>,
    config: FlowConfig,
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow")
            .field("config", &self.config)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl AuthFlow {
    /// Creates a flow writing into `store`.
    pub fn new(
        store: Arc<SessionStore>,
        provider: Arc<dyn IdentityProvider>,
        verifier: Arc<dyn MfaVerifier>,
        config: FlowConfig,
    ) -> Self {
        Self {
            store,
            provider,
            verifier,
            gates: DashMap::new(),
            pending: DashMap::new(),
            expired: DashMap::new(),
            config,
        }
    }

    /// The store this flow writes to.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// The flow settings.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Checks credentials and either stores a session or parks a challenge.
    ///
    /// 1. Refuse if a live challenge exists (an expired one is discarded)
    /// 2. Verify credentials with the provider
    /// 3. Fetch the role profile
    /// 4. Build the session
    /// 5. Park it behind a challenge if MFA is enrolled, else store it
    pub async fn sign_in(
        &self,
        caller: &CallerId,
        email: &str,
        password: &str,
    ) -> Result<SignInOutcome, AuthError> {
        let gate = self.gate(caller);
        let _serial = gate.lock.lock().await;
        let _busy = Authenticating::enter(&gate.authenticating);

        // Step 1: At most one challenge per caller
        if self.expire_challenge(caller).await {
            info!(caller = %caller, "Discarded expired challenge before sign-in");
        }
        if self.pending.contains_key(caller) {
            warn!(caller = %caller, "Sign-in refused: challenge already pending");
            return Err(ChallengeError::ChallengeAlreadyPending.into());
        }

        // Step 2: Verify credentials
        let verified = self
            .bounded(self.provider.verify_credentials(email, password))
            .await
            .map_err(|e| {
                match &e {
                    ProviderError::InvalidCredentials | ProviderError::NotFound => {
                        warn!(caller = %caller, "Sign-in rejected: invalid credentials");
                    }
                    _ => error!(caller = %caller, error = %e, "Credential verification failed"),
                }
                AuthError::from_provider(e)
            })?;

        // Step 3: Fetch the profile
        let profile = match self.bounded(self.provider.fetch_profile(&verified.user_id)).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(caller = %caller, user_id = %verified.user_id, error = %e, "Profile fetch failed");
                self.revoke(caller, [verified.credential]).await;
                return Err(AuthError::ProviderUnavailable(e.to_string()));
            }
        };

        // Step 4: Build the session
        let session = Session::from_profile(
            verified.user_id,
            verified.email,
            verified.credential,
            profile,
        );

        // Step 5: Challenge or commit
        let session_token = session.id;
        if session.mfa_required {
            info!(
                caller = %caller,
                user_id = %session.user_id,
                ttl_secs = self.config.challenge_ttl.as_secs(),
                "MFA challenge issued"
            );
            self.expired.remove(caller);
            self.pending.insert(
                caller.clone(),
                PendingChallenge::new(session, self.config.challenge_ttl),
            );
            return Ok(SignInOutcome {
                requires_mfa: true,
                session_token,
            });
        }

        info!(caller = %caller, user_id = %session.user_id, role = %session.role, "Sign-in successful");
        self.commit(caller, session).await;
        Ok(SignInOutcome {
            requires_mfa: false,
            session_token,
        })
    }

    /// Verifies the second factor of the caller's pending challenge.
    pub async fn verify_mfa(&self, caller: &CallerId, code: &str) -> Result<(), AuthError> {
        let gate = self.gate(caller);
        let _serial = gate.lock.lock().await;

        let (user_id, expired) = match self.pending.get(caller) {
            Some(challenge) => (challenge.session.user_id, challenge.is_expired()),
            None if self.expired.contains_key(caller) => {
                return Err(ChallengeError::ChallengeExpired.into());
            }
            None => return Err(ChallengeError::NoPendingChallenge.into()),
        };
        if expired {
            self.expire_challenge(caller).await;
            warn!(caller = %caller, "MFA challenge expired");
            return Err(ChallengeError::ChallengeExpired.into());
        }

        let accepted = self
            .bounded(self.verifier.verify(&user_id, code))
            .await
            .map_err(|e| {
                error!(caller = %caller, error = %e, "MFA verifier failed");
                AuthError::ProviderUnavailable(e.to_string())
            })?;

        // The challenge may have lapsed while the verifier was working.
        let Some(mut challenge) = self.pending.get_mut(caller) else {
            return Err(ChallengeError::ChallengeExpired.into());
        };
        if challenge.is_expired() {
            drop(challenge);
            self.expire_challenge(caller).await;
            warn!(caller = %caller, "MFA challenge expired during verification");
            return Err(ChallengeError::ChallengeExpired.into());
        }

        if !accepted {
            challenge.attempts += 1;
            let attempts = challenge.attempts;
            drop(challenge);

            if attempts >= self.config.max_attempts {
                warn!(caller = %caller, attempts, "MFA challenge discarded after too many attempts");
                if let Some((_, challenge)) = self.pending.remove(caller) {
                    self.revoke(caller, [challenge.session.credential]).await;
                }
                return Err(ChallengeError::TooManyAttempts.into());
            }
            let remaining_attempts = self.config.max_attempts - attempts;
            warn!(caller = %caller, remaining_attempts, "Invalid MFA code");
            return Err(ChallengeError::InvalidCode { remaining_attempts }.into());
        }
        drop(challenge);

        let Some((_, challenge)) = self.pending.remove(caller) else {
            return Err(ChallengeError::ChallengeExpired.into());
        };
        let mut session = challenge.session;
        session.mfa_satisfied = true;

        info!(caller = %caller, user_id = %session.user_id, role = %session.role, "MFA verified, sign-in complete");
        self.commit(caller, session).await;
        Ok(())
    }

    /// Drops the caller's challenge and session. Always succeeds.
    ///
    /// Provider-side revocation is attempted for every credential dropped;
    /// its failures are logged only.
    pub async fn sign_out(&self, caller: &CallerId) {
        let gate = self.gate(caller);
        let _serial = gate.lock.lock().await;

        let mut credentials = Vec::new();
        if let Some((_, challenge)) = self.pending.remove(caller) {
            credentials.push(challenge.session.credential);
        }
        if let Some(session) = self.store.current(caller) {
            credentials.push(session.credential);
        }
        self.expired.remove(caller);
        self.store.clear(caller, ClearReason::SignOut);

        let revoked = credentials.len();
        self.revoke(caller, credentials).await;
        info!(caller = %caller, revoked, "Signed out");
    }

    /// Bearer token of the caller's parked challenge, if any. Once verified,
    /// the same token names the stored session.
    pub fn pending_token(&self, caller: &CallerId) -> Option<SessionId> {
        self.pending.get(caller).map(|challenge| challenge.session.id)
    }

    /// Reports the caller's current state.
    pub fn state(&self, caller: &CallerId) -> AuthState {
        if self
            .gates
            .get(caller)
            .is_some_and(|gate| gate.authenticating.load(Ordering::SeqCst))
        {
            return AuthState::Authenticating;
        }
        if self.has_live_challenge(caller) {
            return AuthState::MfaPending;
        }
        match self.store.current(caller) {
            Some(session) if session.is_usable() => AuthState::Authenticated,
            Some(_) => AuthState::MfaPending,
            None => AuthState::Anonymous,
        }
    }

    /// Whether the caller has an unexpired challenge.
    pub fn has_live_challenge(&self, caller: &CallerId) -> bool {
        self.pending
            .get(caller)
            .is_some_and(|challenge| !challenge.is_expired())
    }

    /// Number of parked challenges, expired ones included.
    pub fn pending_challenges(&self) -> usize {
        self.pending.len()
    }

    /// Number of caller gates currently allocated.
    pub fn tracked_gates(&self) -> usize {
        self.gates.len()
    }

    /// Stores `session` and revokes the credential of the session it replaces.
    async fn commit(&self, caller: &CallerId, session: Session) {
        let replaced = self
            .store
            .current(caller)
            .map(|previous| previous.credential)
            .filter(|previous| *previous != session.credential);
        self.expired.remove(caller);
        self.store.hydrate(caller, session);
        self.revoke(caller, replaced).await;
    }

    /// Drops the caller's challenge if it has lapsed, remembering the expiry
    /// and revoking its credential. Returns whether one was dropped.
    async fn expire_challenge(&self, caller: &CallerId) -> bool {
        let Some((_, challenge)) = self
            .pending
            .remove_if(caller, |_, challenge| challenge.is_expired())
        else {
            return false;
        };
        self.expired.insert(caller.clone(), Instant::now());
        self.revoke(caller, [challenge.session.credential]).await;
        true
    }

    /// Revokes each credential with the provider. Failures are logged only.
    async fn revoke(&self, caller: &CallerId, credentials: impl IntoIterator<Item = CredentialRef>) {
        for credential in credentials {
            if let Err(e) = self.bounded(self.provider.revoke_session(&credential)).await {
                warn!(
                    caller = %caller,
                    credential = %credential.fingerprint(),
                    error = %e,
                    "Provider-side revocation failed"
                );
            }
        }
    }

    fn gate(&self, caller: &CallerId) -> Arc<CallerGate> {
        Arc::clone(&self.gates.entry(caller.clone()).or_default())
    }

    /// Runs a provider or verifier call under the configured deadline.
    async fn bounded<T, F>(&self, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.config.provider_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Unavailable(format!(
                "no response within {}ms",
                self.config.provider_timeout.as_millis()
            ))),
        }
    }
}
