//! # caregate-auth
//!
//! The access-control core of CareGate.
//!
//! ## Modules
//!
//! - `rate` - sliding-window request throttling per token
//! - `session` - per-caller session store with change notifications
//! - `flow` - sign-in, MFA challenge, sign-out, and provider reconciliation
//! - `access` - the single authorization entry point for privileged actions
//! - `provider` - identity provider boundary and an in-memory implementation
//! - `mfa` - second-factor verifier boundary
//! - `password` - Argon2id hashing and password policy
//! - `provisioning` - admin-gated bulk user creation

pub mod access;
pub mod error;
pub mod flow;
pub mod mfa;
pub mod password;
pub mod provider;
pub mod provisioning;
pub mod rate;
pub mod session;


pub use access::AccessGuard;
pub use error::{AccessDenied, AuthError, ChallengeError, ProviderError, RateLimitExceeded};
pub use flow::{AuthFlow, AuthState, FlowConfig, SignInOutcome};
pub use mfa::{FormatCodeVerifier, MfaVerifier};
pub use password::{PasswordHasher, PasswordValidator};
pub use provider::{IdentityProvider, InMemoryIdentityProvider, UserProvisioner};
pub use provisioning::{ProvisionResult, ProvisioningService};
pub use rate::{RateGuard, RateToken};
pub use session::{SessionStore, Subscription};
