//! Navigation boundary and redirect targets.
//!
//! The session pipeline never renders anything itself. When a guard refuses
//! entry, or a request reveals that the session is gone, it asks a
//! [`Navigator`] to move the user to one of the paths in [`RedirectConfig`].

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Host-provided navigation boundary.
pub trait Navigator: Send + Sync {
    /// Moves the user to `path`.
    fn redirect_to(&self, path: &str);
}

/// Paths used when the pipeline redirects the user.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Login boundary, used when nobody is authenticated.
    /// Default: "/auth/login"
    #[serde(default = "default_login_path")]
    login_path: String,
    /// Neutral authenticated area, used when a role check fails.
    /// Default: "/user/dashboard"
    #[serde(default = "default_user_home")]
    user_home: String,
    /// Landing page for administrators after login.
    /// Default: "/admin/dashboard"
    #[serde(default = "default_admin_home")]
    admin_home: String,
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_user_home() -> String {
    "/user/dashboard".to_string()
}

fn default_admin_home() -> String {
    "/admin/dashboard".to_string()
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            user_home: default_user_home(),
            admin_home: default_admin_home(),
        }
    }
}

impl RedirectConfig {
    /// Creates a configuration with explicit paths.
    #[must_use]
    pub fn new(
        login_path: impl Into<String>,
        user_home: impl Into<String>,
        admin_home: impl Into<String>,
    ) -> Self {
        Self {
            login_path: login_path.into(),
            user_home: user_home.into(),
            admin_home: admin_home.into(),
        }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn user_home(&self) -> &str {
        &self.user_home
    }

    #[must_use]
    pub fn admin_home(&self) -> &str {
        &self.admin_home
    }

    /// Returns where a freshly logged-in user with `role` should land.
    #[must_use]
    pub fn landing_for(&self, role: Role) -> &str {
        if role.is_admin() {
            &self.admin_home
        } else {
            &self.user_home
        }
    }
}
