//! The role enumeration used for access control.
//!
//! Roles form a closed set; every protected operation is gated by an
//! allowed-role slice checked by the auth middleware.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to every operation, including user registration and deletes.
    Admin,
    /// Referring hospital staff: manages patients and places referrals.
    HospitalStaff,
    /// Laboratory technician: manages the test catalog and produces results.
    LabTech,
    /// Read-only access to every resource.
    Viewer,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: &'static [Role] = &[
        Role::Admin,
        Role::HospitalStaff,
        Role::LabTech,
        Role::Viewer,
    ];

    /// Returns the wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::HospitalStaff => "hospital_staff",
            Self::LabTech => "lab_tech",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "hospital_staff" => Ok(Self::HospitalStaff),
            "lab_tech" => Ok(Self::LabTech),
            "viewer" => Ok(Self::Viewer),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}
