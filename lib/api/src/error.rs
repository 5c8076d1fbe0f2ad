//! Error types for the api crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ApiError`: Failures setting up the HTTP transport
//! - `AuthError`: Failures of the login/registration exchange
//!
//! Failed requests themselves are reported as
//! [`ClassifiedError`](crate::classify::ClassifiedError), never as these types.

use std::fmt;

use crate::classify::ClassifiedError;

/// Errors from transport construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The HTTP client could not be built.
    ClientBuild { details: String },
    /// The configured base URL is unusable.
    InvalidBaseUrl { url: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientBuild { details } => {
                write!(f, "failed to build HTTP client: {details}")
            }
            Self::InvalidBaseUrl { url } => {
                write!(f, "invalid API base URL: '{url}'")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Errors from the authentication exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// The request failed and was classified.
    Request(ClassifiedError),
    /// The backend answered but refused the credentials.
    Rejected { message: String },
    /// The backend's answer did not have the expected shape.
    InvalidResponse { details: String },
    /// The session could not be established from a successful answer.
    Session { details: String },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(error) => write!(f, "{error}"),
            Self::Rejected { message } => write!(f, "{message}"),
            Self::InvalidResponse { details } => {
                write!(f, "unexpected authentication response: {details}")
            }
            Self::Session { details } => {
                write!(f, "failed to establish session: {details}")
            }
        }
    }
}

impl std::error::Error for AuthError {}
