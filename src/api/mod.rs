//! The authenticated request pipeline.
//!
//! Every call goes through [`ApiClient::execute`]: the bearer token from the
//! [`TokenStore`] is attached unless the endpoint is public, a 401 on a
//! protected endpoint is repaired by a single coordinated token refresh, and
//! the original request is replayed exactly once with the new token. A
//! replayed request that fails again propagates its error, so a backend that
//! keeps rejecting refreshed tokens can never cause a refresh loop.

pub mod endpoints;
pub mod envelope;
pub mod error;

use crate::api::envelope::{ApiResponse, TokenGrant};
use crate::api::error::{classify_response, RefreshFailed};
use crate::auth::refresh::{RefreshCoordinator, RefreshTicket};
use crate::auth::session::SessionEvent;
use crate::auth::store::TokenStore;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use error::ApiError;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Normalize the configured base URL and join an endpoint path onto it.
///
/// # Errors
/// Returns an error if `base` cannot be parsed, has no host, or uses an
/// unsupported scheme.
pub fn endpoint_url(base: &str, path: &str) -> Result<String, ApiError> {
    let url = Url::parse(base).map_err(|err| ApiError::InvalidUrl(err.to_string()))?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| ApiError::InvalidUrl("no host specified".to_string()))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => {
                return Err(ApiError::InvalidUrl(format!("unsupported scheme {scheme}")));
            }
        },
    };

    // Keep any prefix like `/api/v1` that the base URL carries.
    let base_path = url.path().trim_end_matches('/');
    let endpoint_url = format!("{scheme}://{host}:{port}{base_path}{path}");

    debug!("endpoint URL: {}", endpoint_url);

    Ok(endpoint_url)
}

/// HTTP client for the ModaMint backend.
///
/// Cloning is cheap; clones share the token store, the refresh coordinator,
/// and the session event channel. Separate instances (e.g. the storefront
/// and dashboard adapters) should be built with [`ApiClient::with_coordinator`]
/// around one shared coordinator so the at-most-one-refresh invariant holds
/// process-wide.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: TokenStore,
    coordinator: Arc<RefreshCoordinator>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ApiClient {
    /// Build a client with its own coordinator and session event channel.
    ///
    /// # Errors
    /// Returns an error if `base_url` is invalid or the HTTP client cannot
    /// be constructed.
    pub fn new(
        base_url: &str,
        store: TokenStore,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), ApiError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client =
            Self::with_coordinator(base_url, store, Arc::new(RefreshCoordinator::new()), tx)?;
        Ok((client, rx))
    }

    /// Build a client around an existing coordinator and event sender.
    ///
    /// # Errors
    /// Returns an error if `base_url` is invalid or the HTTP client cannot
    /// be constructed.
    pub fn with_coordinator(
        base_url: &str,
        store: TokenStore,
        coordinator: Arc<RefreshCoordinator>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Self, ApiError> {
        // Fail fast on an unusable base URL instead of on the first request.
        endpoint_url(base_url, "/")?;

        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            store,
            coordinator,
            events,
        })
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// GET an endpoint and decode the envelope's `result`.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] for transport, HTTP, or
    /// application-level failures.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let envelope = self.envelope(Method::GET, path, None).await?;
        Ok(serde_json::from_value(
            envelope.result.unwrap_or(Value::Null),
        )?)
    }

    /// POST a JSON body and decode the envelope's `result`.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] for transport, HTTP, or
    /// application-level failures.
    #[instrument(skip(self, body))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let envelope = self
            .envelope(Method::POST, path, Some(serde_json::to_value(body)?))
            .await?;
        Ok(serde_json::from_value(
            envelope.result.unwrap_or(Value::Null),
        )?)
    }

    /// POST where only the envelope code matters, not the payload.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] for transport, HTTP, or
    /// application-level failures.
    #[instrument(skip(self, body))]
    pub async fn post_ack<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let body = body.map(serde_json::to_value).transpose()?;
        self.envelope(Method::POST, path, body).await.map(|_| ())
    }

    async fn envelope(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let response = self.execute(method, path, body.as_ref()).await?;
        let envelope: ApiResponse<Value> = response.json().await?;

        if !envelope.is_success() {
            let message = if envelope.message.is_empty() {
                "request failed".to_string()
            } else {
                envelope.message
            };
            let err = ApiError::Backend {
                code: envelope.code,
                message,
            };
            warn!(path, "{}", err.user_message());
            return Err(err);
        }

        Ok(envelope)
    }

    /// Run one request through the pipeline: attach, send, recover from a
    /// first 401 via refresh, replay once.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = endpoint_url(&self.base_url, path)?;

        let token = if endpoints::is_public_endpoint(path) {
            None
        } else {
            self.store.access_token()
        };

        let response = self.send_once(&method, &url, body, token.as_ref(), path).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || endpoints::is_public_endpoint(path)
            || endpoints::is_refresh_exempt(path)
        {
            return self.finish(response, path).await;
        }

        debug!(path, "401 received, recovering through token refresh");
        let refreshed = self.refresh_access_token().await?;

        // One replay per request. A second 401 falls through to `finish`
        // and propagates.
        let retry = self
            .send_once(&method, &url, body, Some(&refreshed), path)
            .await?;
        self.finish(retry, path).await
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        token: Option<&SecretString>,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        match request.send().await {
            Ok(response) => Ok(response),
            Err(err) => {
                warn!(path, "cannot reach server: {}", err);
                Err(ApiError::Network(err))
            }
        }
    }

    async fn finish(
        &self,
        response: reqwest::Response,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let err = classify_response(response).await;
        match &err {
            // The 401 path is silent; it only surfaces after recovery failed.
            ApiError::Unauthorized => debug!(path, "unauthorized"),
            other => warn!(path, "{}", other.user_message()),
        }
        Err(err)
    }

    /// Obtain a fresh access token, deduplicating concurrent attempts.
    ///
    /// The first caller performs the `/auth/refresh` call; callers arriving
    /// while it is in flight park behind it and receive its outcome. On an
    /// irrecoverable failure the stored credentials are cleared and a
    /// [`SessionEvent::SessionExpired`] is emitted so the consumer can send
    /// the user back to the login entry point.
    ///
    /// # Errors
    /// Returns [`ApiError::NotAuthenticated`] when no refresh token is
    /// stored, or the refresh failure otherwise.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> Result<SecretString, ApiError> {
        match self.coordinator.begin_refresh() {
            RefreshTicket::Follower(rx) => {
                let outcome = rx
                    .await
                    .map_err(|_| RefreshFailed::new("refresh abandoned"))?;
                Ok(outcome?)
            }
            RefreshTicket::Leader => match self.refresh_once().await {
                Ok(token) => {
                    self.coordinator.complete_refresh(&Ok(token.clone()));
                    info!("access token refreshed");
                    Ok(token)
                }
                Err(err) => {
                    self.coordinator
                        .complete_refresh(&Err(err.as_refresh_failure()));

                    if matches!(err, ApiError::NotAuthenticated) {
                        // Never logged in; nothing to clear or redirect.
                        return Err(err);
                    }

                    warn!("token refresh failed, ending session: {}", err);
                    if let Err(clear_err) = self.store.clear() {
                        warn!("failed to clear credentials: {}", clear_err);
                    }
                    let _ = self.events.send(SessionEvent::SessionExpired);
                    Err(err)
                }
            },
        }
    }

    async fn refresh_once(&self) -> Result<SecretString, ApiError> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(ApiError::NotAuthenticated)?;

        let url = endpoint_url(&self.base_url, endpoints::AUTH_REFRESH)?;
        let payload = json!({ "refreshToken": refresh_token.expose_secret() });

        debug!("refreshing access token");
        let response = self.http.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }

        let envelope: ApiResponse<TokenGrant> = response.json().await?;
        if !envelope.is_success() {
            return Err(ApiError::Backend {
                code: envelope.code,
                message: envelope.message,
            });
        }
        let grant = envelope
            .result
            .ok_or_else(|| RefreshFailed::new("refresh response missing result"))?;

        let access_token = SecretString::from(grant.access_token);
        self.store.update_tokens(
            access_token.clone(),
            grant.refresh_token.map(SecretString::from),
        )?;

        Ok(access_token)
    }
}
