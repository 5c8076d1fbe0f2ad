//! Login, registration, and logout.
//!
//! A successful login or registration answer carries the user profile and
//! a bearer token inside the backend's `ApiResponse` envelope; both are
//! handed to [`SessionStore::establish`](emi_portal_session::SessionStore::establish)
//! together. Logout is local: the session is cleared without a network call.

use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::{info, instrument};

use emi_portal_session::{AccessToken, UserProfile};

use crate::client::ApiClient;
use crate::error::AuthError;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

/// Credentials for `/auth/login`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// New-account details for `/auth/register`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("mobile", &self.mobile)
            .finish_non_exhaustive()
    }
}

/// The backend's response envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct AuthPayload {
    user: UserProfile,
    token: String,
}

/// Authentication calls that establish or end the session.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Logs in and establishes the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend refuses the
    /// credentials, or the session cannot be established. The session is
    /// unchanged in every error case except a classified 401.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<UserProfile, Report<AuthError>> {
        let body = serde_json::to_value(request).map_err(|e| AuthError::InvalidResponse {
            details: e.to_string(),
        })?;
        self.exchange(LOGIN_PATH, body).await
    }

    /// Registers a new account and establishes the session.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<UserProfile, Report<AuthError>> {
        let body = serde_json::to_value(request).map_err(|e| AuthError::InvalidResponse {
            details: e.to_string(),
        })?;
        self.exchange(REGISTER_PATH, body).await
    }

    /// Ends the session locally. Returns true if someone was logged in.
    pub fn logout(&self) -> bool {
        let ended = self.client.session().clear();
        if ended {
            info!("logged out");
        }
        ended
    }

    async fn exchange(&self, path: &str, body: JsonValue) -> Result<UserProfile, Report<AuthError>> {
        let value = self
            .client
            .post(path, body)
            .await
            .map_err(AuthError::Request)?;

        let response: ApiResponse<AuthPayload> =
            serde_json::from_value(value).map_err(|e| AuthError::InvalidResponse {
                details: e.to_string(),
            })?;

        if !response.success {
            return Err(AuthError::Rejected {
                message: response
                    .message
                    .unwrap_or_else(|| "Authentication failed.".to_string()),
            }
            .into());
        }

        let payload = response.data.ok_or_else(|| AuthError::InvalidResponse {
            details: "missing data".to_string(),
        })?;

        let user = payload.user.clone();
        self.client
            .session()
            .establish(payload.user, AccessToken::new(payload.token))
            .map_err(|e| AuthError::Session {
                details: e.to_string(),
            })?;

        info!(user_id = %user.id(), role = %user.role(), "authenticated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::harness;
    use crate::exchange::{FailedExchange, HttpMethod};
    use emi_portal_session::{Role, Session};
    use serde_json::json;

    fn credentials() -> LoginRequest {
        LoginRequest {
            email: "priya@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn auth_success(token: &str, role: &str) -> JsonValue {
        json!({
            "success": true,
            "message": "Login successful",
            "data": {
                "user": {
                    "id": 21,
                    "fullName": "Priya",
                    "email": "priya@example.com",
                    "mobile": "9000000000",
                    "kycStatus": "Pending",
                    "creditScore": 690,
                    "monthlyIncome": 60000,
                    "role": role
                },
                "token": token
            }
        })
    }

    #[tokio::test]
    async fn login_establishes_session() {
        let h = harness();
        h.transport.push(Ok(auth_success("jwt-abc", "Admin")));
        let auth = AuthApi::new(h.client.clone());

        let user = auth.login(&credentials()).await.expect("login");

        assert!(user.is_admin());
        let session = h.client.session().current();
        assert_eq!(session.user(), Some(&user));
        assert_eq!(session.token().map(AccessToken::as_str), Some("jwt-abc"));

        let sent = h.transport.sent();
        assert_eq!(sent[0].path, "/auth/login");
        assert_eq!(sent[0].body, Some(json!({"email": "priya@example.com", "password": "hunter2"})));
    }

    #[tokio::test]
    async fn register_establishes_session() {
        let h = harness();
        h.transport.push(Ok(auth_success("jwt-new", "User")));
        let auth = AuthApi::new(h.client.clone());

        let user = auth
            .register(&RegisterRequest {
                full_name: "Priya".to_string(),
                email: "priya@example.com".to_string(),
                mobile: "9000000000".to_string(),
                password: "pw".to_string(),
            })
            .await
            .expect("register");

        assert_eq!(user.role(), Role::Standard);
        assert!(h.client.session().current().is_authenticated());
        let sent = h.transport.sent();
        assert_eq!(sent[0].path, "/auth/register");
        assert_eq!(
            sent[0].body.as_ref().and_then(|b| b.get("fullName")),
            Some(&json!("Priya"))
        );
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_rejected_without_session() {
        let h = harness();
        h.transport.push(Ok(json!({
            "success": false,
            "message": "Invalid email or password"
        })));
        let auth = AuthApi::new(h.client.clone());

        let result = auth.login(&credentials()).await;

        assert!(result.is_err());
        assert_eq!(h.client.session().current(), Session::empty());
    }

    #[tokio::test]
    async fn empty_token_is_not_accepted() {
        let h = harness();
        h.transport.push(Ok(auth_success("", "User")));
        let auth = AuthApi::new(h.client.clone());

        assert!(auth.login(&credentials()).await.is_err());
        assert!(!h.client.session().current().is_authenticated());
    }

    #[tokio::test]
    async fn malformed_answer_is_invalid_response() {
        let h = harness();
        h.transport.push(Ok(json!({"success": true, "data": {"token": "t"}})));
        let auth = AuthApi::new(h.client.clone());

        assert!(auth.login(&credentials()).await.is_err());
        assert!(!h.client.session().current().is_authenticated());
    }

    #[tokio::test]
    async fn failed_request_surfaces_classified_error() {
        let h = harness();
        h.transport.push(Err(FailedExchange::new(
            HttpMethod::Post,
            "http://backend/auth/login",
            400,
            "Bad Request",
        )
        .with_payload(Some(json!({"success": false, "message": "Account locked"})))));
        let auth = AuthApi::new(h.client.clone());

        let err = auth.login(&credentials()).await.expect_err("400");

        assert!(err.to_string().contains("Account locked"));
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let h = harness();
        h.transport.push(Ok(auth_success("jwt", "User")));
        let auth = AuthApi::new(h.client.clone());
        auth.login(&credentials()).await.expect("login");

        assert!(auth.logout());
        assert!(!auth.logout());
        assert_eq!(h.client.session().current(), Session::empty());
    }

    #[test]
    fn request_debug_hides_password() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("priya@example.com"));
        assert!(!debug.contains("hunter2"));
    }
}
