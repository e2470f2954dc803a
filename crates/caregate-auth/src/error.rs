//! Typed errors for the access-control core.
//!
//! Each enum converts into [`AppError`] so the HTTP layer and the binary
//! only ever see one error shape.

use std::time::Duration;

use caregate_core::AppError;
use thiserror::Error;

/// The only message ever shown for a failed credential check.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// The request budget for a token is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate limit exceeded, retry after {}ms", retry_after.as_millis())]
pub struct RateLimitExceeded {
    /// Time until the oldest counted request leaves the window.
    pub retry_after: Duration,
}

/// Failures reported by an identity provider, provisioner or MFA verifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Email or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The requested user does not exist.
    #[error("user not found")]
    NotFound,
    /// The provider refused the request (e.g. duplicate email).
    #[error("rejected: {0}")]
    Rejected(String),
    /// The provider could not be reached or answered in time.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Problems with the second-factor challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChallengeError {
    /// A live challenge already exists for this caller.
    #[error("a verification challenge is already pending")]
    ChallengeAlreadyPending,
    /// The challenge outlived its TTL and was discarded.
    #[error("the verification challenge has expired")]
    ChallengeExpired,
    /// The code was wrong; the challenge is still pending.
    #[error("invalid verification code, {remaining_attempts} attempt(s) remaining")]
    InvalidCode {
        /// Attempts left before the challenge is discarded.
        remaining_attempts: u32,
    },
    /// The attempt budget is spent and the challenge was discarded.
    #[error("too many failed verification attempts")]
    TooManyAttempts,
    /// There is no challenge to verify.
    #[error("no verification challenge is pending")]
    NoPendingChallenge,
}

/// Failures of the explicit sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The provider rejected the credentials.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// The provider or verifier failed or timed out.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// A challenge-state problem.
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
}

impl AuthError {
    /// Map a provider failure seen during sign-in.
    pub fn from_provider(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidCredentials | ProviderError::NotFound => Self::InvalidCredentials,
            ProviderError::Rejected(msg) | ProviderError::Unavailable(msg) => {
                Self::ProviderUnavailable(msg)
            }
        }
    }
}

/// Reasons a privileged action is refused, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// No session for the caller.
    #[error("authentication required")]
    Unauthenticated,
    /// A session exists but its second factor is outstanding.
    #[error("multi-factor verification required")]
    MfaRequired,
    /// The session's role is not admitted.
    #[error("insufficient role")]
    InsufficientRole,
    /// The session does not cover the requested scope.
    #[error("resource scope not granted")]
    ScopeDenied,
    /// The rate budget is exhausted.
    #[error("rate limit exceeded")]
    RateLimitExceeded {
        /// Time until another request would be admitted.
        retry_after: Duration,
    },
}

impl AccessDenied {
    /// Short machine-readable reason, used in logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::MfaRequired => "mfa_required",
            Self::InsufficientRole => "insufficient_role",
            Self::ScopeDenied => "scope_denied",
            Self::RateLimitExceeded { .. } => "rate_limited",
        }
    }
}

impl From<RateLimitExceeded> for AccessDenied {
    fn from(err: RateLimitExceeded) -> Self {
        Self::RateLimitExceeded {
            retry_after: err.retry_after,
        }
    }
}

impl From<RateLimitExceeded> for AppError {
    fn from(err: RateLimitExceeded) -> Self {
        AppError::rate_limited("Too many requests", err.retry_after)
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match &err {
            ProviderError::InvalidCredentials => {
                AppError::authentication(INVALID_CREDENTIALS_MESSAGE)
            }
            ProviderError::NotFound => AppError::validation("User not found"),
            ProviderError::Rejected(msg) => AppError::conflict(msg.clone()),
            ProviderError::Unavailable(_) => {
                AppError::service_unavailable("Identity provider unavailable")
            }
        }
    }
}

impl From<ChallengeError> for AppError {
    fn from(err: ChallengeError) -> Self {
        match err {
            ChallengeError::ChallengeAlreadyPending => AppError::conflict(err.to_string()),
            ChallengeError::NoPendingChallenge => AppError::validation(err.to_string()),
            ChallengeError::ChallengeExpired
            | ChallengeError::InvalidCode { .. }
            | ChallengeError::TooManyAttempts => AppError::authentication(err.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::authentication(INVALID_CREDENTIALS_MESSAGE),
            AuthError::ProviderUnavailable(_) => {
                AppError::service_unavailable("Identity provider unavailable")
            }
            AuthError::Challenge(inner) => inner.into(),
        }
    }
}

impl From<AccessDenied> for AppError {
    fn from(err: AccessDenied) -> Self {
        match err {
            AccessDenied::Unauthenticated => AppError::authentication("Authentication required"),
            AccessDenied::MfaRequired => {
                AppError::mfa_required("Multi-factor verification required")
            }
            AccessDenied::InsufficientRole | AccessDenied::ScopeDenied => {
                AppError::authorization("Access denied")
            }
            AccessDenied::RateLimitExceeded { retry_after } => {
                AppError::rate_limited("Too many requests", retry_after)
            }
        }
    }
}
