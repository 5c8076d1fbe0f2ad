//! Session state and access control for the EMI portal client.
//!
//! This crate provides:
//! - The authenticated user's profile (`UserProfile`, `Role`)
//! - The session snapshot (`Session`, `AccessToken`)
//! - Durable storage for the persisted session (`KeyValueStore`, `FileStore`)
//! - The single writer of session state (`SessionStore`) with ordered,
//!   replay-latest subscriptions
//! - Admission guards for protected navigation (`AccessControl`, `Guard`)
//!
//! # Example
//!
//! ```
//! use emi_portal_core::UserId;
//! use emi_portal_session::{
//!     AccessControl, AccessDenied, AccessToken, MemoryStore, RedirectConfig, Role,
//!     SessionStore, UserProfile,
//! };
//! use std::sync::Arc;
//!
//! let store = Arc::new(SessionStore::restored(Arc::new(MemoryStore::new())));
//! let access = AccessControl::new(store.clone(), RedirectConfig::default());
//! assert_eq!(access.require_authenticated(), Err(AccessDenied::Unauthenticated));
//!
//! let user = UserProfile::new(UserId::new(1), "Asha", "asha@example.com", Role::Standard);
//! store.establish(user, AccessToken::new("token")).expect("establish");
//!
//! assert!(access.require_authenticated().is_ok());
//! assert_eq!(access.require_role(Role::Admin), Err(AccessDenied::Forbidden));
//! ```

pub mod error;
pub mod guard;
pub mod navigation;
pub mod role;
pub mod session;
pub mod storage;
pub mod store;
pub mod user;

// Re-export main types at crate root
pub use error::{AccessDenied, SessionError, StorageError};
pub use guard::{AccessControl, Guard};
pub use navigation::{Navigator, RedirectConfig};
pub use role::Role;
pub use session::{AccessToken, Session};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};
pub use store::{SessionStore, SessionUpdates};
pub use user::UserProfile;
