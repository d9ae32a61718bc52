//! High-level session operations: login, logout, introspection, profile.

use crate::api::endpoints;
use crate::api::envelope::TokenGrant;
use crate::api::{ApiClient, ApiError};
use crate::auth::credentials::{Credentials, UserProfile};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

/// Emitted when the session ends without the user asking for it, i.e. an
/// irrecoverable refresh failure. The consumer reacts by sending the user
/// to the login entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SessionExpired,
}

#[derive(Debug, Deserialize)]
struct IntrospectResult {
    #[serde(default)]
    valid: bool,
}

/// Session operations on top of an [`ApiClient`].
#[derive(Clone)]
pub struct AuthSession {
    client: ApiClient,
}

impl AuthSession {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Authenticate and persist the issued tokens. The profile is fetched
    /// separately; failing to load it does not fail the login.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] when the login call fails or the
    /// credentials cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Credentials, ApiError> {
        let grant: TokenGrant = self
            .client
            .post_json(
                endpoints::AUTH_LOGIN,
                &json!({
                    "username": username,
                    "password": password.expose_secret(),
                }),
            )
            .await?;

        let credentials = Credentials::new(
            SecretString::from(grant.access_token),
            grant.refresh_token.map(SecretString::from),
        );
        self.client.store().save(credentials)?;
        info!(username, "logged in");

        match self.me().await {
            Ok(user) => self.client.store().set_user(user)?,
            Err(err) => debug!("could not load profile after login: {}", err),
        }

        Ok(self.client.store().credentials())
    }

    /// Invalidate the session server-side, then drop local credentials.
    /// The local record is cleared even when the server call fails.
    ///
    /// # Errors
    /// Returns an error only if the local record cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Err(err) = self
            .client
            .post_ack::<serde_json::Value>(endpoints::AUTH_LOGOUT, None)
            .await
        {
            warn!("logout call failed, clearing local session anyway: {}", err);
        }

        self.client.store().clear()?;
        info!("logged out");
        Ok(())
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] on failure.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.client.get_json(endpoints::AUTH_ME).await
    }

    /// Ask the backend whether a token is still valid.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] on failure.
    #[instrument(skip(self, token))]
    pub async fn introspect(&self, token: &SecretString) -> Result<bool, ApiError> {
        let result: IntrospectResult = self
            .client
            .post_json(
                endpoints::AUTH_INTROSPECT,
                &json!({ "token": token.expose_secret() }),
            )
            .await?;
        Ok(result.valid)
    }

    /// Change the password of the authenticated user.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] on failure.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        current_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), ApiError> {
        self.client
            .post_ack(
                endpoints::AUTH_CHANGE_PASSWORD,
                Some(&json!({
                    "currentPassword": current_password.expose_secret(),
                    "newPassword": new_password.expose_secret(),
                })),
            )
            .await
    }
}
