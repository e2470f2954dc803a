//! The single authorization entry point.

use std::num::NonZeroU32;
use std::sync::Arc;

use caregate_core::types::CallerId;
use caregate_entity::session::{ResourceScope, Session};
use caregate_entity::user::Role;
use tracing::{debug, warn};

use crate::error::AccessDenied;
use crate::rate::{RateGuard, RateToken};
use crate::session::SessionStore;

/// Decides whether a caller may perform a privileged action.
///
/// Checks run in a fixed order and the first failure wins:
/// session present, second factor passed, role admitted, scope granted,
/// rate budget left. The rate budget is only charged when every earlier
/// check passed.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    store: Arc<SessionStore>,
    rate: Arc<RateGuard>,
}

impl AccessGuard {
    /// Creates a guard over the given store and rate guard.
    pub fn new(store: Arc<SessionStore>, rate: Arc<RateGuard>) -> Self {
        Self { store, rate }
    }

    /// Authorizes the caller and returns the session snapshot it was
    /// authorized with.
    pub fn authorize(
        &self,
        caller: &CallerId,
        required: &[Role],
        scope: Option<&ResourceScope>,
        rate_token: &RateToken,
        limit: NonZeroU32,
    ) -> Result<Session, AccessDenied> {
        let result = self.evaluate(caller, required, scope, rate_token, limit);
        match &result {
            Ok(session) => debug!(
                caller = %caller,
                user_id = %session.user_id,
                role = %session.role,
                "Access granted"
            ),
            Err(denied) => warn!(caller = %caller, reason = denied.reason(), "Access denied"),
        }
        result
    }

    fn evaluate(
        &self,
        caller: &CallerId,
        required: &[Role],
        scope: Option<&ResourceScope>,
        rate_token: &RateToken,
        limit: NonZeroU32,
    ) -> Result<Session, AccessDenied> {
        let session = self
            .store
            .current(caller)
            .ok_or(AccessDenied::Unauthenticated)?;

        if !session.is_usable() {
            return Err(AccessDenied::MfaRequired);
        }
        if !required.contains(&session.role) {
            return Err(AccessDenied::InsufficientRole);
        }
        if let Some(scope) = scope {
            if !session.has_scope(scope) {
                return Err(AccessDenied::ScopeDenied);
            }
        }
        self.rate.check(limit, rate_token)?;

        Ok(session)
    }
}
