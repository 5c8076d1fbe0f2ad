//! Request and failed-exchange descriptions.
//!
//! An [`ApiRequest`] is what callers hand to a transport. A
//! [`FailedExchange`] is what a transport hands back when the call did not
//! succeed: the target, the numeric status (0 when no response arrived), and
//! the response payload if there was one.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use emi_portal_session::AccessToken;

/// HTTP method of an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Returns the method's wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown HTTP method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown HTTP method: {}", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// An outbound call to the backend API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// Path relative to the configured base URL (e.g. "/loans/my").
    pub path: String,
    /// JSON body, if any.
    pub body: Option<JsonValue>,
    /// Bearer credential to attach, if any.
    pub bearer: Option<AccessToken>,
}

impl ApiRequest {
    /// Creates a request without body or credential.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Option<JsonValue>) -> Self {
        self.body = body;
        self
    }

    /// Attaches a bearer credential.
    #[must_use]
    pub fn with_bearer(mut self, token: AccessToken) -> Self {
        self.bearer = Some(token);
        self
    }
}

/// Description of a call that did not succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedExchange {
    /// Method of the failed call.
    pub method: HttpMethod,
    /// Target URL of the failed call.
    pub url: String,
    /// Response status, or 0 when no response was received.
    pub status: u16,
    /// Reason phrase accompanying the status, empty when unknown.
    pub status_text: String,
    /// Response body, if one was received.
    pub payload: Option<JsonValue>,
}

impl FailedExchange {
    /// Describes a response with a non-success status.
    #[must_use]
    pub fn new(
        method: HttpMethod,
        url: impl Into<String>,
        status: u16,
        status_text: impl Into<String>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            status,
            status_text: status_text.into(),
            payload: None,
        }
    }

    /// Describes a call for which no response arrived at all.
    #[must_use]
    pub fn no_response(method: HttpMethod, url: impl Into<String>) -> Self {
        Self::new(method, url, 0, "Unknown Error")
    }

    /// Attaches the response body.
    #[must_use]
    pub fn with_payload(mut self, payload: Option<JsonValue>) -> Self {
        self.payload = payload;
        self
    }

    /// Returns true if a response was received.
    #[must_use]
    pub fn has_response(&self) -> bool {
        self.status != 0
    }

    /// Returns "METHOD url", the form used in messages and diagnostics.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// Returns the string field `name` of an object payload, if non-empty.
    #[must_use]
    pub fn payload_str(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .get(name)?
            .as_str()
            .filter(|s| !s.is_empty())
    }

    /// Returns the field `name` of an object payload unless it is null,
    /// `false`, or an empty string.
    #[must_use]
    pub fn payload_field(&self, name: &str) -> Option<&JsonValue> {
        self.payload
            .as_ref()?
            .get(name)
            .filter(|v| match v {
                JsonValue::Null | JsonValue::Bool(false) => false,
                JsonValue::String(s) => !s.is_empty(),
                _ => true,
            })
    }
}
