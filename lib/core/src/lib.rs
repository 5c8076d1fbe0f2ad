//! Core types shared by the EMI portal client crates.
//!
//! This crate provides the `Result` alias used across the workspace and the
//! strongly-typed identifiers for backend entities.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, UserId};
