//! Session snapshot for the current portal user.
//!
//! A `Session` is either empty or holds a user profile together with the
//! bearer token issued for it. The two travel as one value so a profile
//! without a token (or the reverse) cannot be represented.

use std::fmt;

use crate::role::Role;
use crate::user::UserProfile;

/// Opaque bearer credential issued by the backend at login.
///
/// The `Debug` output is redacted so tokens do not leak into logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a token from the raw credential string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw credential for use in an `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the credential is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl From<String> for AccessToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccessToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Credentials {
    user: UserProfile,
    token: AccessToken,
}

/// Point-in-time view of the authentication state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    /// Returns the unauthenticated session.
    #[must_use]
    pub fn empty() -> Self {
        Self { credentials: None }
    }

    /// Returns an authenticated session for `user` holding `token`.
    #[must_use]
    pub fn authenticated(user: UserProfile, token: AccessToken) -> Self {
        Self {
            credentials: Some(Credentials { user, token }),
        }
    }

    /// Returns the authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.credentials.as_ref().map(|c| &c.user)
    }

    /// Returns the bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&AccessToken> {
        self.credentials.as_ref().map(|c| &c.token)
    }

    /// Returns the current user's role, if anyone is logged in.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user().map(UserProfile::role)
    }

    /// Returns true if a user is logged in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Returns true if the logged-in user is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(UserProfile::is_admin)
    }
}
