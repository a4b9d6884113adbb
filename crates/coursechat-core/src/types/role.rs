//! Platform role of a chat participant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Role carried by an identity and stamped on every message it sends.
///
/// Unspecified roles default to `student`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Enrolled learner.
    #[default]
    Student,
    /// Runs a course.
    Coach,
    /// Platform staff.
    Admin,
    /// Sells courses on the marketplace.
    Seller,
    /// Platform owner.
    Superadmin,
}

impl UserRole {
    /// Every role, in wire order.
    pub const ALL: [UserRole; 5] = [
        Self::Student,
        Self::Coach,
        Self::Admin,
        Self::Seller,
        Self::Superadmin,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Coach => "coach",
            Self::Admin => "admin",
            Self::Seller => "seller",
            Self::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::validation(format!("Unknown user role '{wanted}'")))
    }
}
