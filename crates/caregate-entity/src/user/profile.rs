//! Role profile returned by the identity provider.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::session::ResourceScope;

use super::Role;

/// Authorization facts about a user, fetched fresh on every resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleProfile {
    /// The user's role.
    pub role: Role,
    /// Whether the user must pass a second factor to obtain a usable session.
    pub mfa_enrolled: bool,
    /// Resource scopes the user may act on.
    #[serde(default)]
    pub scopes: BTreeSet<ResourceScope>,
}

impl RoleProfile {
    /// A profile with no scopes.
    pub fn new(role: Role, mfa_enrolled: bool) -> Self {
        Self {
            role,
            mfa_enrolled,
            scopes: BTreeSet::new(),
        }
    }

    /// Add scopes to the profile.
    pub fn with_scopes<I>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = ResourceScope>,
    {
        self.scopes.extend(scopes);
        self
    }
}
