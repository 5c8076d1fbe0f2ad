//! Strongly-typed identifiers for backend entities.
//!
//! The loan-servicing backend issues plain integer keys. Wrapping them keeps
//! a user key from being passed where a loan or payment key is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed wrapper around a backend integer key.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw backend key.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw backend key.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e: ParseIntError| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a portal user.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_display_is_raw_number() {
        assert_eq!(UserId::new(42).to_string(), "42");
    }

    #[test]
    fn parse_valid_id() {
        let id: UserId = " 17 ".parse().expect("should parse");
        assert_eq!(id.get(), 17);
    }

    #[test]
    fn parse_invalid_id() {
        let result: Result<UserId, _> = "usr_abc".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "UserId");
    }

    #[test]
    fn id_serializes_as_plain_number() {
        let json = serde_json::to_string(&UserId::new(7)).expect("serialize");
        assert_eq!(json, "7");
        let parsed: UserId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(parsed, UserId::new(7));
    }
}
