//! Pending second-factor challenge.

use std::time::Duration;

use caregate_entity::session::Session;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// A session parked until its second factor is verified.
#[derive(Debug, Clone)]
pub struct PendingChallenge {
    /// The fully built session, not yet visible in the store.
    pub session: Session,
    /// When the challenge was issued.
    pub issued_at: DateTime<Utc>,
    /// Monotonic deadline after which the challenge is void.
    pub expires_at: Instant,
    /// Failed verification attempts so far.
    pub attempts: u32,
}

impl PendingChallenge {
    /// Parks `session` for `ttl`.
    pub fn new(session: Session, ttl: Duration) -> Self {
        Self {
            session,
            issued_at: Utc::now(),
            expires_at: Instant::now() + ttl,
            attempts: 0,
        }
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}
