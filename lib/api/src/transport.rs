//! Outbound transport.
//!
//! The [`Transport`] trait is the seam between the request pipeline and the
//! network. [`HttpTransport`] is the production implementation on `reqwest`;
//! tests substitute their own.

use async_trait::async_trait;
use reqwest::Url;
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::exchange::{ApiRequest, FailedExchange};

/// Issues requests and reports failures as [`FailedExchange`]s.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the decoded success payload.
    ///
    /// # Errors
    ///
    /// Returns the failed exchange when no response arrived or the response
    /// status was not a success.
    async fn send(&self, request: ApiRequest) -> Result<JsonValue, FailedExchange>;
}

/// `reqwest`-backed transport rooted at the configured API base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL or the
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Report<ApiError>> {
        let parsed = Url::parse(base_url).map_err(|_| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
            }
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild {
                details: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` onto the base URL.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Decodes a response body: JSON when possible, otherwise the raw text as a
/// JSON string. An empty body decodes to `None`.
fn decode_body(text: &str) -> Option<JsonValue> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_string())))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<JsonValue, FailedExchange> {
        let url = self.url_for(&request.path);
        let mut builder = self.client.request(request.method.into(), &url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, %url, "no response received");
                return Err(FailedExchange::no_response(request.method, url));
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, %url, "failed to read response body");
                String::new()
            }
        };
        let payload = decode_body(&text);

        if status.is_success() {
            return Ok(payload.unwrap_or(JsonValue::Null));
        }

        Err(FailedExchange::new(
            request.method,
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
        )
        .with_payload(payload))
    }
}
