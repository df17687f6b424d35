//! Session-aware HTTP client. Every backend call goes through [`ApiClient`],
//! which applies two policies:
//!
//! - outbound: the current credential, if any, is attached as
//!   `Authorization: Bearer <token>`; without one the request goes out
//!   unauthenticated;
//! - inbound: a `401` triggers the injected [`UnauthorizedHandler`] once for
//!   that response, and the caller still gets [`ApiError::Unauthorized`].
//!
//! The client knows nothing about storage or navigation; both come in through
//! the two traits below. It never logs token material.

use crate::{
    api::errors::{ApiError, DEFAULT_ERROR_MESSAGE},
    config::{build_url_with_base, AppConfig},
    session::types::Credential,
    APP_USER_AGENT,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::{debug, instrument, warn};
use url::Url;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// Supplies the credential for the outbound policy.
pub trait CredentialSource: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

/// Reacts to a rejected credential. Must tolerate being called repeatedly and
/// concurrently.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

/// `{ data: T }` success envelope.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
    on_unauthorized: Arc<dyn UnauthorizedHandler>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        config: &AppConfig,
        credentials: Arc<dyn CredentialSource>,
        on_unauthorized: Arc<dyn UnauthorizedHandler>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            credentials,
            on_unauthorized,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path);
        self.send(request).await
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path).query(query);
        self.send(request).await
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        self.send(request).await
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path).json(body);
        self.send(request).await
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::DELETE, path);
        self.send(request).await
    }

    /// Builds a request against the base URL and applies the outbound policy.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = build_url_with_base(&self.base_url, path);
        let request = self.http.request(method, url);

        match self.credentials.credential() {
            Some(credential) => request.bearer_auth(credential.expose()),
            None => request,
        }
    }

    /// Sends the request, applies the inbound policy and unwraps the `data`
    /// envelope.
    ///
    /// # Errors
    /// - [`ApiError::Unauthorized`] on `401`, after the unauthorized handler ran.
    /// - [`ApiError::Http`] on any other non-success status.
    /// - [`ApiError::Timeout`] / [`ApiError::Network`] when the server is unreachable.
    /// - [`ApiError::Parse`] when the body is not a `{ data }` envelope of `T`.
    #[instrument(skip_all)]
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = request
            .build()
            .map_err(|err| ApiError::Serialization(format!("Failed to build request: {err}")))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        debug!(%method, %path, "sending request");

        let response = self.http.execute(request).await.map_err(map_request_error)?;
        self.handle_response(response, &method, &path).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        method: &Method,
        path: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            warn!(%method, %path, "credential rejected, tearing down session");
            self.on_unauthorized.on_unauthorized();
            return Err(ApiError::Unauthorized {
                message: error_message(&body),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%method, %path, status = status.as_u16(), "request failed");
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body = response.bytes().await.map_err(map_request_error)?;

        serde_json::from_slice::<Envelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    }
}

/// Maps transport errors into timeout or network failures.
fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Prefers the server's `{ message }`; otherwise a trimmed, truncated body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
        {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        DEFAULT_ERROR_MESSAGE.to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{
        net::TcpListener,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    struct FixedCredential(Option<&'static str>);

    impl CredentialSource for FixedCredential {
        fn credential(&self) -> Option<Credential> {
            self.0.map(Credential::new)
        }
    }

    #[derive(Default)]
    struct CountingHandler(AtomicUsize);

    impl UnauthorizedHandler for CountingHandler {
        fn on_unauthorized(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn client(uri: &str, token: Option<&'static str>) -> (ApiClient, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::default());
        let config = AppConfig::new(uri).unwrap();
        let client = ApiClient::new(
            &config,
            Arc::new(FixedCredential(token)),
            Arc::clone(&handler) as Arc<dyn UnauthorizedHandler>,
        )
        .unwrap();
        (client, handler)
    }

    #[test]
    fn error_message_prefers_server_message() {
        assert_eq!(
            error_message(r#"{"message":"Gate already exists"}"#),
            "Gate already exists"
        );
        assert_eq!(error_message("  plain failure  "), "plain failure");
        assert_eq!(error_message(""), DEFAULT_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"message":"  "}"#), r#"{"message":"  "}"#);
        assert_eq!(error_message(&"x".repeat(500)).len(), MAX_ERROR_CHARS);
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_present() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gates"))
            .and(header("Authorization", "Bearer tok-A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "_id": "g1", "name": "North" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, handler) = client(&server.uri(), Some("tok-A"));
        let gates: Vec<Value> = client.get("/gates").await.unwrap();

        assert_eq!(gates.len(), 1);
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn omits_authorization_without_credential() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/trucks/register-new-truck"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": { "truck": {}, "contractor": {}, "factory": {} }
            })))
            .mount(&server)
            .await;

        let (client, _) = client(&server.uri(), None);
        let _: Value = client
            .post("/trucks/register-new-truck", &json!({ "plate": "ABC-123" }))
            .await
            .unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn unauthorized_runs_handler_once_and_still_fails() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })),
            )
            .mount(&server)
            .await;

        let (client, handler) = client(&server.uri(), Some("tok-A"));
        let error = client.get::<Vec<Value>>("/users").await.unwrap_err();

        assert_eq!(
            error,
            ApiError::Unauthorized {
                message: "Token expired".to_string()
            }
        );
        assert_eq!(handler.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_unauthorized_responses_each_notify() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (client, handler) = client(&server.uri(), Some("tok-A"));
        let (users, gates, trucks) = tokio::join!(
            client.get::<Value>("/users"),
            client.get::<Value>("/gates"),
            client.get::<Value>("/trucks"),
        );

        assert!(users.unwrap_err().is_unauthorized());
        assert!(gates.unwrap_err().is_unauthorized());
        assert!(trucks.unwrap_err().is_unauthorized());
        assert_eq!(handler.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn business_errors_pass_through_without_teardown() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/contractors"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "message": "Contractor already exists" })),
            )
            .mount(&server)
            .await;

        let (client, handler) = client(&server.uri(), Some("tok-A"));
        let error = client
            .post::<_, Value>("/contractors", &json!({ "name": "Acme" }))
            .await
            .unwrap_err();

        assert_eq!(
            error,
            ApiError::Http {
                status: 409,
                message: "Contractor already exists".to_string()
            }
        );
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn query_parameters_are_forwarded() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/trucks"))
            .and(query_param("gate", "g1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = client(&server.uri(), None);
        let trucks: Vec<Value> = client
            .get_with_query("/trucks", &[("gate", "g1")])
            .await
            .unwrap();
        assert!(trucks.is_empty());
    }

    #[tokio::test]
    async fn missing_envelope_is_a_parse_error() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "u1" })))
            .mount(&server)
            .await;

        let (client, _) = client(&server.uri(), Some("tok-A"));
        let error = client.get::<Value>("/auth/me").await.unwrap_err();
        assert!(matches!(error, ApiError::Parse(_)));
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/factories"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = AppConfig::new(&server.uri())
            .unwrap()
            .with_request_timeout(Duration::from_millis(100));
        let client = ApiClient::new(
            &config,
            Arc::new(FixedCredential(None)),
            Arc::new(CountingHandler::default()),
        )
        .unwrap();

        let error = client.get::<Value>("/factories").await.unwrap_err();
        assert!(matches!(error, ApiError::Timeout(_)));
    }

    #[tokio::test]
    async fn stalled_body_is_a_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            return;
        };
        let address = listener.local_addr().unwrap();

        // Headers arrive on time, the body never completes.
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0_u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"data\":";
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let config = AppConfig::new(&format!("http://{address}"))
            .unwrap()
            .with_request_timeout(Duration::from_millis(300));
        let client = ApiClient::new(
            &config,
            Arc::new(FixedCredential(None)),
            Arc::new(CountingHandler::default()),
        )
        .unwrap();

        let error = client.get::<Value>("/trucks").await.unwrap_err();
        assert!(matches!(error, ApiError::Timeout(_)), "got {error:?}");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0");
        let Ok(listener) = listener else {
            return;
        };
        let address = listener.local_addr().unwrap();
        drop(listener);

        let (client, handler) = client(&format!("http://{address}"), None);
        let error = client.get::<Value>("/gates").await.unwrap_err();

        assert!(matches!(error, ApiError::Network(_)));
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }
}
