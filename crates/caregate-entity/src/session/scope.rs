//! Resource scope value type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named slice of data a session may act on, e.g. `patient:42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceScope(String);

impl ResourceScope {
    /// Wrap a scope name.
    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    /// Borrow the scope name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceScope {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ResourceScope {
    fn from(s: String) -> Self {
        Self(s)
    }
}
