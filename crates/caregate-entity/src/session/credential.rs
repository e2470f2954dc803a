//! Opaque credential handed out by the identity provider.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A provider-issued credential. Never printed in full.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialRef(String);

impl CredentialRef {
    /// Wrap a raw credential string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Short SHA-256 fingerprint suitable for logs.
    pub fn fingerprint(&self) -> String {
        let digest = format!("{:x}", Sha256::digest(self.0.as_bytes()));
        digest[..12].to_string()
    }
}

impl fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialRef({})", self.fingerprint())
    }
}
