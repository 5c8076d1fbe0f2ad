//! Shared `Result` alias.
//!
//! Crates keep their own error enums (`StorageError`, `SessionError`,
//! `AuthError`, ...) and report them through `rootcause::Report`; this alias
//! only shortens the signature.

use rootcause::Report;

/// `Result` carrying a `Report` of the crate's error context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
