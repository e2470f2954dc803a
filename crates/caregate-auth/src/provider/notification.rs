//! Session changes pushed by the identity provider.

use caregate_core::types::{CallerId, UserId};
use caregate_entity::session::CredentialRef;
use chrono::{DateTime, Utc};

/// What changed on the provider side.
#[derive(Debug, Clone)]
pub enum SessionChange {
    /// The provider no longer holds a session for the caller.
    SignedOut,
    /// The provider holds a (possibly new) session for the caller.
    Refreshed {
        /// The user the provider session belongs to.
        user_id: UserId,
        /// The user's canonical email.
        email: String,
        /// The provider's current credential.
        credential: CredentialRef,
    },
}

/// A provider-side session change for one caller.
#[derive(Debug, Clone)]
pub struct SessionNotification {
    /// The affected caller.
    pub caller: CallerId,
    /// When the provider made the change.
    pub issued_at: DateTime<Utc>,
    /// The change itself.
    pub change: SessionChange,
}

impl SessionNotification {
    /// A "no session" notification stamped now.
    pub fn signed_out(caller: CallerId) -> Self {
        Self {
            caller,
            issued_at: Utc::now(),
            change: SessionChange::SignedOut,
        }
    }

    /// A refresh notification stamped now.
    pub fn refreshed(
        caller: CallerId,
        user_id: UserId,
        email: impl Into<String>,
        credential: CredentialRef,
    ) -> Self {
        Self {
            caller,
            issued_at: Utc::now(),
            change: SessionChange::Refreshed {
                user_id,
                email: email.into(),
                credential,
            },
        }
    }

    /// Overrides the issue time.
    pub fn issued_at(mut self, at: DateTime<Utc>) -> Self {
        self.issued_at = at;
        self
    }
}
