//! Session-aware API client.
//!
//! [`ApiClient`] attaches the current bearer credential to every request and
//! routes every failure through the [`RequestErrorClassifier`], so callers
//! see exactly one error shape regardless of what went wrong.

use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

use emi_portal_session::SessionStore;

use crate::classify::{ClassifiedError, RequestErrorClassifier};
use crate::exchange::{ApiRequest, HttpMethod};
use crate::transport::Transport;

/// Entry point for calls to the backend API.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    classifier: Arc<RequestErrorClassifier>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<SessionStore>,
        classifier: Arc<RequestErrorClassifier>,
    ) -> Self {
        Self {
            transport,
            session,
            classifier,
        }
    }

    /// Returns the session store this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Sends a request and returns the success payload.
    ///
    /// # Errors
    ///
    /// Returns the classified failure. A 401 has already cleared the session
    /// and redirected to login by the time the error is returned.
    #[instrument(skip(self, body))]
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<JsonValue>,
    ) -> Result<JsonValue, ClassifiedError> {
        let mut request = ApiRequest::new(method, path).with_body(body);
        if let Some(token) = self.session.current().token() {
            request = request.with_bearer(token.clone());
        }

        self.transport
            .send(request)
            .await
            .map_err(|failed| self.classifier.classify(&failed))
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    pub async fn get(&self, path: &str) -> Result<JsonValue, ClassifiedError> {
        self.request(HttpMethod::Get, path, None).await
    }

    /// Sends a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    pub async fn post(&self, path: &str, body: JsonValue) -> Result<JsonValue, ClassifiedError> {
        self.request(HttpMethod::Post, path, Some(body)).await
    }

    /// Sends a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    pub async fn put(&self, path: &str, body: JsonValue) -> Result<JsonValue, ClassifiedError> {
        self.request(HttpMethod::Put, path, Some(body)).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    pub async fn delete(&self, path: &str) -> Result<JsonValue, ClassifiedError> {
        self.request(HttpMethod::Delete, path, None).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::classify::ErrorKind;
    use crate::exchange::FailedExchange;
    use async_trait::async_trait;
    use emi_portal_core::UserId;
    use emi_portal_session::{
        AccessToken, MemoryStore, Navigator, RedirectConfig, Role, UserProfile,
    };
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport replaying scripted outcomes and recording what it was sent.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<JsonValue, FailedExchange>>>,
        sent: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn push(&self, outcome: Result<JsonValue, FailedExchange>) {
            self.outcomes.lock().expect("lock").push_back(outcome);
        }

        pub(crate) fn sent(&self) -> Vec<ApiRequest> {
            self.sent.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: ApiRequest) -> Result<JsonValue, FailedExchange> {
            let url = format!("http://backend{}", request.path);
            let method = request.method;
            self.sent.lock().expect("lock").push(request);
            self.outcomes
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Err(FailedExchange::no_response(method, url)))
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingNavigator {
        pub(crate) visits: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect_to(&self, path: &str) {
            self.visits.lock().expect("lock").push(path.to_string());
        }
    }

    pub(crate) struct Harness {
        pub(crate) transport: Arc<ScriptedTransport>,
        pub(crate) navigator: Arc<RecordingNavigator>,
        pub(crate) client: ApiClient,
    }

    pub(crate) fn harness() -> Harness {
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStore::new())));
        let transport = Arc::new(ScriptedTransport::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let classifier = Arc::new(RequestErrorClassifier::new(
            session.clone(),
            navigator.clone(),
            RedirectConfig::default(),
            "http://backend",
        ));
        let client = ApiClient::new(transport.clone(), session, classifier);
        Harness {
            transport,
            navigator,
            client,
        }
    }

    fn log_in(client: &ApiClient) {
        let user = UserProfile::new(UserId::new(2), "Dev", "dev@example.com", Role::Standard);
        client
            .session()
            .establish(user, AccessToken::new("bearer-123"))
            .expect("establish");
    }

    #[tokio::test]
    async fn attaches_bearer_when_logged_in() {
        let h = harness();
        log_in(&h.client);
        h.transport.push(Ok(json!({"ok": true})));

        let payload = h.client.get("/loans/my").await.expect("success");

        assert_eq!(payload, json!({"ok": true}));
        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].bearer.as_ref().map(AccessToken::as_str),
            Some("bearer-123")
        );
    }

    #[tokio::test]
    async fn no_bearer_without_session() {
        let h = harness();
        h.transport.push(Ok(JsonValue::Null));

        h.client
            .post("/auth/login", json!({"email": "a"}))
            .await
            .expect("success");

        let sent = h.transport.sent();
        assert!(sent[0].bearer.is_none());
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].body, Some(json!({"email": "a"})));
    }

    #[tokio::test]
    async fn unauthorized_response_logs_out_and_redirects() {
        let h = harness();
        log_in(&h.client);
        h.transport.push(Err(FailedExchange::new(
            HttpMethod::Get,
            "http://backend/users/profile",
            401,
            "Unauthorized",
        )));

        let err = h.client.get("/users/profile").await.expect_err("401");

        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert!(!h.client.session().current().is_authenticated());
        assert_eq!(
            *h.navigator.visits.lock().expect("lock"),
            vec!["/auth/login".to_string()]
        );

        // The next call goes out without a credential.
        h.transport.push(Ok(JsonValue::Null));
        h.client.get("/auth/ping").await.expect("success");
        assert!(h.transport.sent()[1].bearer.is_none());
    }

    #[tokio::test]
    async fn unreachable_backend_is_classified() {
        let h = harness();

        let err = h.client.delete("/loans/9").await.expect_err("no response");

        assert_eq!(err.kind(), ErrorKind::Unreachable);
        assert!(err.is_retryable());
    }
}
