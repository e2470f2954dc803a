//! Session-related domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CallerId, SessionId, UserId};

/// Why a caller's session was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearReason {
    /// The caller signed out explicitly.
    SignOut,
    /// The identity provider reported that no session exists anymore.
    ProviderSignedOut,
    /// The provider refreshed into an identity that still needs a second factor.
    ReverificationRequired,
}

/// Events related to a caller's session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A fully built session was stored for the caller.
    Hydrated {
        /// The caller whose session changed.
        caller: CallerId,
        /// The session ID.
        session_id: SessionId,
        /// The user the session belongs to.
        user_id: UserId,
        /// Monotonic per-caller revision after the write.
        revision: u64,
        /// Whether the session passes the MFA check.
        usable: bool,
        /// When the write was applied.
        at: DateTime<Utc>,
    },
    /// The caller's session was removed.
    Cleared {
        /// The caller whose session changed.
        caller: CallerId,
        /// The user whose session was removed.
        user_id: UserId,
        /// Monotonic per-caller revision after the write.
        revision: u64,
        /// Why the session was removed.
        reason: ClearReason,
        /// When the write was applied.
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// The caller the event belongs to.
    pub fn caller(&self) -> &CallerId {
        match self {
            Self::Hydrated { caller, .. } | Self::Cleared { caller, .. } => caller,
        }
    }

    /// The revision reached by the write that produced the event.
    pub fn revision(&self) -> u64 {
        match self {
            Self::Hydrated { revision, .. } | Self::Cleared { revision, .. } => *revision,
        }
    }
}
