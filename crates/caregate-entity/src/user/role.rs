//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles a CareGate account can hold.
///
/// Roles are not ordered. Every privileged action names the exact set of
/// roles it admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A patient viewing their own records.
    Patient,
    /// A family member or aide acting for a patient.
    Caregiver,
    /// A licensed clinician.
    Clinician,
    /// A researcher with de-identified access.
    Researcher,
    /// A system administrator.
    Admin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 5] = [
        Self::Patient,
        Self::Caregiver,
        Self::Clinician,
        Self::Researcher,
        Self::Admin,
    ];

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Caregiver => "caregiver",
            Self::Clinician => "clinician",
            Self::Researcher => "researcher",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = caregate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patient" => Ok(Self::Patient),
            "caregiver" => Ok(Self::Caregiver),
            "clinician" => Ok(Self::Clinician),
            "researcher" => Ok(Self::Researcher),
            "admin" => Ok(Self::Admin),
            _ => Err(caregate_core::AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: patient, caregiver, clinician, researcher, admin"
            ))),
        }
    }
}
