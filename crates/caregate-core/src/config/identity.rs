//! In-memory identity provider seed data.

use serde::{Deserialize, Serialize};

/// Configuration of the bundled in-memory identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Accounts created at startup.
    #[serde(default)]
    pub seed_users: Vec<SeedUser>,
}

/// An account created when the server starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    /// Login email.
    pub email: String,
    /// Plaintext password, hashed on load.
    pub password: String,
    /// Role name (`patient`, `caregiver`, `clinician`, `researcher`, `admin`).
    pub role: String,
    /// Whether the account must pass a second factor.
    #[serde(default)]
    pub mfa_enrolled: bool,
    /// Resource scopes granted to the account.
    #[serde(default)]
    pub scopes: Vec<String>,
}
