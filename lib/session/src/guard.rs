//! Admission guards for protected navigation.
//!
//! Guards read the session snapshot at the moment of the navigation attempt
//! and are never cached: a forced logout between two attempts must be seen
//! by the second one.

use std::sync::Arc;
use tracing::debug;

use crate::error::AccessDenied;
use crate::navigation::{Navigator, RedirectConfig};
use crate::role::Role;
use crate::session::Session;
use crate::store::SessionStore;
use crate::user::UserProfile;

/// A single admission requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Someone must be logged in.
    Authenticated,
    /// The logged-in user must hold this role. Implies `Authenticated`.
    Role(Role),
}

const PUBLIC: &[Guard] = &[];
const USER_AREA: &[Guard] = &[Guard::Authenticated];
const ADMIN_AREA: &[Guard] = &[Guard::Authenticated, Guard::Role(Role::Admin)];

impl Guard {
    /// Returns the guards protecting `path` in the portal's route layout.
    ///
    /// `/admin/**` needs an authenticated admin, `/user/**` needs any
    /// authenticated user, and everything else is public.
    #[must_use]
    pub fn for_path(path: &str) -> &'static [Guard] {
        let in_area = |prefix: &str| {
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        };

        if in_area("/admin") {
            ADMIN_AREA
        } else if in_area("/user") {
            USER_AREA
        } else {
            PUBLIC
        }
    }

    fn evaluate<'a>(&self, session: &'a Session) -> Result<&'a UserProfile, AccessDenied> {
        let user = session.user().ok_or(AccessDenied::Unauthenticated)?;
        match self {
            Self::Authenticated => Ok(user),
            Self::Role(required) if user.role() == *required => Ok(user),
            Self::Role(_) => Err(AccessDenied::Forbidden),
        }
    }
}

/// Stateless admission checks over a shared [`SessionStore`].
#[derive(Debug, Clone)]
pub struct AccessControl {
    session: Arc<SessionStore>,
    redirects: RedirectConfig,
}

impl AccessControl {
    #[must_use]
    pub fn new(session: Arc<SessionStore>, redirects: RedirectConfig) -> Self {
        Self { session, redirects }
    }

    /// Succeeds with the current user when someone is logged in.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied::Unauthenticated` when the session is empty.
    pub fn require_authenticated(&self) -> Result<UserProfile, AccessDenied> {
        let session = self.session.current();
        Guard::Authenticated.evaluate(&session).cloned()
    }

    /// Succeeds with the current user when they are logged in and hold `role`.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied::Unauthenticated` when the session is empty and
    /// `AccessDenied::Forbidden` when the user holds a different role.
    pub fn require_role(&self, role: Role) -> Result<UserProfile, AccessDenied> {
        let session = self.session.current();
        Guard::Role(role).evaluate(&session).cloned()
    }

    /// Evaluates `guards` in order against one snapshot of the session.
    ///
    /// # Errors
    ///
    /// Returns the first denial.
    pub fn check(&self, guards: &[Guard]) -> Result<(), AccessDenied> {
        let session = self.session.current();
        guards
            .iter()
            .try_for_each(|guard| guard.evaluate(&session).map(|_| ()))
    }

    /// Returns the path a denied user is sent to.
    ///
    /// An unauthenticated user goes to the login boundary; an authenticated
    /// user lacking a role goes to the neutral authenticated area.
    #[must_use]
    pub fn redirect_for(&self, denial: AccessDenied) -> &str {
        match denial {
            AccessDenied::Unauthenticated => self.redirects.login_path(),
            AccessDenied::Forbidden => self.redirects.user_home(),
        }
    }

    /// Checks `guards` and redirects through `navigator` on denial.
    ///
    /// Returns true if entry is allowed. Denials are resolved here and never
    /// surface to the caller as errors.
    pub fn enter(&self, guards: &[Guard], navigator: &dyn Navigator) -> bool {
        match self.check(guards) {
            Ok(()) => true,
            Err(denial) => {
                let target = self.redirect_for(denial);
                debug!(%denial, target, "navigation denied");
                navigator.redirect_to(target);
                false
            }
        }
    }

    /// Admits or redirects a navigation to `path` using the portal route layout.
    pub fn admit(&self, path: &str, navigator: &dyn Navigator) -> bool {
        self.enter(Guard::for_path(path), navigator)
    }

    /// Returns the redirect configuration.
    #[must_use]
    pub fn redirects(&self) -> &RedirectConfig {
        &self.redirects
    }
}
