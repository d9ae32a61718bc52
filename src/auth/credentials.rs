//! The persisted credentials record and its tolerant parser.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Profile fields the backend returns from `/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A session's token material. Presence of `access_token` is the sole
/// signal of "authenticated" used elsewhere; there is no separate flag.
#[derive(Clone, Default)]
pub struct Credentials {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user: Option<UserProfile>,
}

impl Credentials {
    #[must_use]
    pub fn new(access_token: SecretString, refresh_token: Option<SecretString>) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token,
            user: None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Serialize to the on-disk `authData` layout.
    #[must_use]
    pub fn to_record(&self) -> Value {
        let mut record = json!({});
        if let Some(token) = &self.access_token {
            record["accessToken"] = Value::from(token.expose_secret());
        }
        if let Some(token) = &self.refresh_token {
            record["refreshToken"] = Value::from(token.expose_secret());
        }
        if let Some(user) = &self.user {
            record["user"] = serde_json::to_value(user).unwrap_or(Value::Null);
        }
        record
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
}

fn non_empty_secret(raw: Option<String>) -> Option<SecretString> {
    raw.filter(|token| !token.is_empty()).map(SecretString::from)
}

/// Parse a raw `authData` record. Total: a missing, truncated, or otherwise
/// malformed record reads as "logged out", never as an error.
#[must_use]
pub fn parse_credentials(raw: &str) -> Credentials {
    match serde_json::from_str::<RawRecord>(raw) {
        Ok(record) => Credentials {
            access_token: non_empty_secret(record.access_token),
            refresh_token: non_empty_secret(record.refresh_token),
            user: record.user,
        },
        Err(err) => {
            debug!("malformed auth record, treating as logged out: {}", err);
            Credentials::default()
        }
    }
}
