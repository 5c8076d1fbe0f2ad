//! Classification of failed requests.
//!
//! Every failed call passes through [`RequestErrorClassifier::classify`],
//! which evaluates an ordered decision table (first match wins):
//!
//! | Condition | Kind | Retryable |
//! |---|---|---|
//! | no response (status 0) | `Unreachable` | yes |
//! | 401 | `Unauthenticated` | no |
//! | 403 | `Forbidden` | no |
//! | 404 | `NotFound` | no |
//! | 500 | `ServerFault` | yes |
//! | payload has a `message` | `ApplicationError` | no |
//! | anything else | `Unknown` | no |
//!
//! A 401 also clears the session and redirects to the login boundary. A 500
//! emits a structured diagnostic on the `tracing` error channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use tracing::{error, warn};

use emi_portal_session::{Navigator, RedirectConfig, SessionStore};

use crate::exchange::FailedExchange;

const SESSION_EXPIRED: &str = "Session expired. Please login again.";
const FORBIDDEN: &str = "You do not have permission to access this resource.";
const NOT_FOUND: &str = "Resource not found.";

/// Category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No response was received.
    Unreachable,
    /// The backend rejected the credential (401).
    Unauthenticated,
    /// The backend refused the operation (403).
    Forbidden,
    /// The resource does not exist (404).
    NotFound,
    /// The backend failed internally (500).
    ServerFault,
    /// The backend reported an application-level error message.
    ApplicationError,
    /// None of the above.
    Unknown,
}

impl ErrorKind {
    /// Applies the decision table to `exchange`.
    #[must_use]
    pub fn of(exchange: &FailedExchange) -> Self {
        match exchange.status {
            0 => Self::Unreachable,
            401 => Self::Unauthenticated,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500 => Self::ServerFault,
            _ if exchange.payload_str("message").is_some() => Self::ApplicationError,
            _ => Self::Unknown,
        }
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable | Self::ServerFault)
    }

    /// Returns what the caller should do about a failure of this kind.
    #[must_use]
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::Unreachable | Self::ServerFault => Recovery::Retry,
            Self::Unauthenticated => Recovery::LogIn,
            _ => Recovery::Report,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unreachable => "unreachable",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::ServerFault => "server_fault",
            Self::ApplicationError => "application_error",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Recovery action associated with a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recovery {
    /// The request may be retried as-is.
    Retry,
    /// The user has to log in again; the session is already gone.
    LogIn,
    /// Show the message; retrying will not help.
    Report,
}

/// Developer-facing detail captured for server faults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// "METHOD url" of the failed call.
    pub endpoint: String,
    pub status: u16,
    pub status_text: String,
    /// When the failure was classified.
    pub timestamp: DateTime<Utc>,
    /// First of the backend's `message`, `error`, or `title` fields.
    pub backend_message: Option<String>,
    /// First of the backend's `details` or `errors` fields.
    pub backend_details: Option<JsonValue>,
    /// The complete response body.
    pub payload: Option<JsonValue>,
}

impl Diagnostic {
    fn capture(exchange: &FailedExchange) -> Self {
        let backend_message = ["message", "error", "title"]
            .into_iter()
            .find_map(|field| exchange.payload_str(field))
            .map(str::to_string);
        let backend_details = ["details", "errors"]
            .into_iter()
            .find_map(|field| exchange.payload_field(field))
            .cloned();

        Self {
            endpoint: exchange.endpoint(),
            status: exchange.status,
            status_text: exchange.status_text.clone(),
            timestamp: Utc::now(),
            backend_message,
            backend_details,
            payload: exchange.payload.clone(),
        }
    }

    /// Renders the backend details for a human: strings verbatim, anything
    /// else as indented JSON.
    #[must_use]
    pub fn details_text(&self) -> Option<String> {
        self.backend_details.as_ref().map(|details| match details {
            JsonValue::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        })
    }

    /// Short user-facing summary of the fault.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut message = format!("Internal server error at {}.", self.endpoint);
        if let Some(backend_message) = &self.backend_message {
            message.push_str(&format!("\n\nError: {backend_message}"));
        }
        if let Some(details) = self.details_text() {
            message.push_str(&format!("\n\nDetails: {details}"));
        }
        message.push_str("\n\nCheck the client log for more details.");
        message
    }

    fn emit(&self) {
        error!(
            endpoint = %self.endpoint,
            status = self.status,
            status_text = %self.status_text,
            timestamp = %self.timestamp.to_rfc3339(),
            backend_message = self.backend_message.as_deref(),
            backend_details = self.details_text().as_deref(),
            payload = self.payload.as_ref().map(ToString::to_string).as_deref(),
            "500 Internal Server Error"
        );
    }
}

/// Normalized outcome of a failed call.
///
/// `Display` and the serialized form carry only the user-facing message;
/// the server-fault diagnostic is available through
/// [`diagnostic`](Self::diagnostic) for logging and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    kind: ErrorKind,
    user_message: String,
    retryable: bool,
    #[serde(skip)]
    diagnostic: Option<Diagnostic>,
}

impl ClassifiedError {
    /// Creates an error of `kind` with the given message and the kind's
    /// default retryability.
    #[must_use]
    pub fn new(kind: ErrorKind, user_message: impl Into<String>) -> Self {
        Self {
            kind,
            user_message: user_message.into(),
            retryable: kind.is_retryable(),
            diagnostic: None,
        }
    }

    fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Returns the server-fault diagnostic, if this is a `ServerFault`.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostic.as_ref()
    }

    #[must_use]
    pub fn recovery(&self) -> Recovery {
        self.kind.recovery()
    }

    /// Returns true if the failure ended the session.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        self.kind == ErrorKind::Unauthenticated
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message)
    }
}

impl std::error::Error for ClassifiedError {}

/// Turns failed exchanges into [`ClassifiedError`]s and applies the
/// session side effects they require.
pub struct RequestErrorClassifier {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    redirects: RedirectConfig,
    unreachable_message: String,
}

impl fmt::Debug for RequestErrorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestErrorClassifier")
            .field("redirects", &self.redirects)
            .finish_non_exhaustive()
    }
}

impl RequestErrorClassifier {
    /// Creates a classifier.
    ///
    /// `api_base_url` only feeds the connectivity troubleshooting message.
    #[must_use]
    pub fn new(
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        redirects: RedirectConfig,
        api_base_url: &str,
    ) -> Self {
        let unreachable_message = format!(
            "Cannot connect to the server. Please ensure:\n\
             1. The backend server is running at {api_base_url}\n\
             2. The network and any proxy allow requests to it\n\
             3. The configured API base URL is correct"
        );
        Self {
            session,
            navigator,
            redirects,
            unreachable_message,
        }
    }

    /// Classifies `exchange`. Never fails.
    ///
    /// On `Unauthenticated` the session is cleared and the navigator is sent
    /// to the login boundary before the error is returned. Classification
    /// does not depend on session state, so a late 401 after a logout simply
    /// clears an already-empty session again.
    pub fn classify(&self, exchange: &FailedExchange) -> ClassifiedError {
        let kind = ErrorKind::of(exchange);
        let classified = match kind {
            ErrorKind::Unreachable => ClassifiedError::new(kind, self.unreachable_message.clone()),
            ErrorKind::Unauthenticated => {
                self.session.clear();
                self.navigator.redirect_to(self.redirects.login_path());
                ClassifiedError::new(kind, SESSION_EXPIRED)
            }
            ErrorKind::Forbidden => ClassifiedError::new(kind, FORBIDDEN),
            ErrorKind::NotFound => ClassifiedError::new(kind, NOT_FOUND),
            ErrorKind::ServerFault => {
                let diagnostic = Diagnostic::capture(exchange);
                diagnostic.emit();
                ClassifiedError::new(kind, diagnostic.summary()).with_diagnostic(diagnostic)
            }
            ErrorKind::ApplicationError => {
                let message = exchange.payload_str("message").unwrap_or_default();
                ClassifiedError::new(kind, message)
            }
            ErrorKind::Unknown => ClassifiedError::new(
                kind,
                format!(
                    "Error Code: {}\nMessage: Http failure response for {}: {} {}",
                    exchange.status, exchange.url, exchange.status, exchange.status_text
                ),
            ),
        };

        warn!(
            kind = %classified.kind(),
            endpoint = %exchange.endpoint(),
            status = exchange.status,
            user_message = classified.user_message(),
            "request failed"
        );
        classified
    }
}
