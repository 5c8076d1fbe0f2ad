//! Role type for portal access control.
//!
//! The backend assigns each account a single role string. Only `"Admin"`
//! unlocks the administrative area; every other value is a standard borrower.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Portal access role carried on the user profile.
///
/// - `Standard`: a borrower with access to their own loans and payments
/// - `Admin`: loan officer with approval and oversight capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Standard borrower access.
    #[default]
    Standard,
    /// Administrator access.
    Admin,
}

impl Role {
    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the wire name used by the backend.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "User",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        if value == "Admin" {
            Self::Admin
        } else {
            Self::Standard
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_admin() {
        assert!(!Role::Standard.is_admin());
        assert!(Role::Admin.is_admin());
    }

    #[test]
    fn role_serialization_format() {
        let json = serde_json::to_string(&Role::Admin).expect("serialize");
        assert_eq!(json, "\"Admin\"");

        let json = serde_json::to_string(&Role::Standard).expect("serialize");
        assert_eq!(json, "\"User\"");
    }

    #[test]
    fn unknown_role_strings_are_standard() {
        let role: Role = serde_json::from_str("\"Borrower\"").expect("deserialize");
        assert_eq!(role, Role::Standard);

        // Matching is exact, like the backend's own comparison.
        let role: Role = serde_json::from_str("\"admin\"").expect("deserialize");
        assert_eq!(role, Role::Standard);
    }
}
