//! Request pipeline for the EMI portal client.
//!
//! This crate provides:
//!
//! - **Failed-exchange model**: `FailedExchange`, `ApiRequest`, `HttpMethod`
//! - **Classifier**: `RequestErrorClassifier` turning every failed call into a
//!   `ClassifiedError` and forcing a logout on 401
//! - **Transport**: the `Transport` seam and its `reqwest` implementation
//! - **Client**: `ApiClient` (bearer attachment + classification) and
//!   `AuthApi` (login, registration, logout)

pub mod auth;
pub mod classify;
pub mod client;
pub mod error;
pub mod exchange;
pub mod transport;

pub use auth::{ApiResponse, AuthApi, LoginRequest, RegisterRequest};
pub use classify::{ClassifiedError, Diagnostic, ErrorKind, Recovery, RequestErrorClassifier};
pub use client::ApiClient;
pub use error::{ApiError, AuthError};
pub use exchange::{ApiRequest, FailedExchange, HttpMethod, UnknownMethod};
pub use transport::{HttpTransport, Transport};
