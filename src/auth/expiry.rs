//! Proactive token renewal.
//!
//! Complements the reactive 401 pipeline: a periodic task inspects the
//! stored access token's `exp` claim and refreshes it before it lapses,
//! so most requests never see a 401 at all. The refresh goes through the
//! same [`RefreshCoordinator`](crate::auth::refresh::RefreshCoordinator)
//! as the reactive path, so the two can never race into concurrent
//! refresh calls. If the proactive refresh fails, the client has already
//! cleared the credentials and emitted a session event; the task stops.

use crate::api::ApiClient;
use crate::auth::jwt;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

/// How often the stored token is inspected.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Refresh when the token expires within this window.
pub const EXPIRY_LOOKAHEAD: Duration = Duration::from_secs(10 * 60);

/// Spawn the watcher. The first check runs immediately, then every
/// [`CHECK_INTERVAL`]. The task ends when a refresh fails, terminating
/// the session, or when the handle is dropped by an exiting process.
pub fn spawn_expiry_watcher(client: ApiClient) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(CHECK_INTERVAL);

        loop {
            ticker.tick().await;

            if !check_once(&client).await {
                return;
            }
        }
    })
}

/// One inspection pass. Returns `false` when the session ended and the
/// watcher should stop.
pub async fn check_once(client: &ApiClient) -> bool {
    let Some(token) = client.store().access_token() else {
        debug!("no session, skipping expiry check");
        return true;
    };

    if !jwt::expires_within(token.expose_secret(), EXPIRY_LOOKAHEAD) {
        debug!("access token still fresh");
        return true;
    }

    info!("access token expiring soon, refreshing");
    match client.refresh_access_token().await {
        Ok(_) => true,
        Err(err) => {
            // The client already cleared the store and signalled the logout.
            error!("proactive refresh failed, session ended: {}", err);
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::credentials::Credentials;
    use crate::auth::session::SessionEvent;
    use crate::auth::store::TokenStore;
    use base64ct::{Base64UrlUnpadded, Encoding};
    use secrecy::SecretString;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn token_expiring_in(seconds: i64) -> String {
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = json!({ "sub": "u-1", "exp": jwt::unix_now() + seconds });
        let body = Base64UrlUnpadded::encode_string(payload.to_string().as_bytes());
        format!("{header}.{body}.sig")
    }

    fn store_with_token(dir: &tempfile::TempDir, access_token: &str) -> TokenStore {
        let store = TokenStore::open(dir.path().join("authData.json"));
        store
            .save(Credentials::new(
                SecretString::from(access_token.to_string()),
                Some(SecretString::from("R1".to_string())),
            ))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn expiring_token_is_refreshed_through_the_pipeline() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        // Expires in one minute, well inside the ten-minute lookahead.
        let store = store_with_token(&dir, &token_expiring_in(60));

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({ "refreshToken": "R1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 1000,
                "message": "ok",
                "result": { "accessToken": "T2", "refreshToken": "R2" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _events) = ApiClient::new(&server.uri(), store.clone()).unwrap();
        assert!(check_once(&client).await);

        assert_eq!(
            store
                .access_token()
                .map(|t| secrecy::ExposeSecret::expose_secret(&t).to_string()),
            Some("T2".to_string())
        );
    }

    #[tokio::test]
    async fn fresh_token_is_left_alone() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_token(&dir, &token_expiring_in(3600));

        let (client, _events) = ApiClient::new(&server.uri(), store).unwrap();
        assert!(check_once(&client).await);

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_session_skips_the_check() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::open(dir.path().join("authData.json"));

        let (client, _events) = ApiClient::new(&server.uri(), store).unwrap();
        assert!(check_once(&client).await);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_proactive_refresh_terminates_the_session() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_token(&dir, &token_expiring_in(60));

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "code": 9999, "message": "refresh token expired" })),
            )
            .mount(&server)
            .await;

        let (client, mut events) = ApiClient::new(&server.uri(), store.clone()).unwrap();
        assert!(!check_once(&client).await);

        assert!(!store.is_authenticated());
        assert!(matches!(events.recv().await, Some(SessionEvent::SessionExpired)));
    }
}
