//! Session entity model.

use std::collections::BTreeSet;

use caregate_core::types::{SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::user::{Role, RoleProfile};

use super::{CredentialRef, ResourceScope};

/// A verified, role-annotated session.
///
/// Sessions are always built whole, with role, scopes and MFA flags resolved
/// from a fresh [`RoleProfile`], before they are stored.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// The user this session belongs to.
    pub user_id: UserId,
    /// The user's email, as verified by the provider.
    pub email: String,
    /// Provider credential backing this session.
    #[serde(skip_serializing)]
    pub credential: CredentialRef,
    /// The user's role at the time of the last resolution.
    pub role: Role,
    /// Whether the profile demands a second factor.
    pub mfa_required: bool,
    /// Whether the second factor has been passed.
    pub mfa_satisfied: bool,
    /// Resource scopes granted to the user.
    pub scopes: BTreeSet<ResourceScope>,
    /// When the session was first established.
    pub created_at: DateTime<Utc>,
    /// When the session was last rebuilt from provider data.
    pub last_reconciled_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from verified credentials and a freshly fetched profile.
    pub fn from_profile(
        user_id: UserId,
        email: impl Into<String>,
        credential: CredentialRef,
        profile: RoleProfile,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            user_id,
            email: email.into(),
            credential,
            role: profile.role,
            mfa_required: profile.mfa_enrolled,
            mfa_satisfied: false,
            scopes: profile.scopes,
            created_at: now,
            last_reconciled_at: now,
        }
    }

    /// Whether the session may be used for privileged actions.
    pub fn is_usable(&self) -> bool {
        !self.mfa_required || self.mfa_satisfied
    }

    /// Check whether the session covers a resource scope.
    pub fn has_scope(&self, scope: &ResourceScope) -> bool {
        self.scopes.contains(scope)
    }

    /// Replace provider-derived fields, keeping identity and MFA progress.
    pub fn refresh(&mut self, credential: CredentialRef, profile: RoleProfile) {
        self.credential = credential;
        self.role = profile.role;
        self.mfa_required = profile.mfa_enrolled;
        self.scopes = profile.scopes;
        self.last_reconciled_at = Utc::now();
    }
}
