//! Client-side inspection of JWT claims.
//!
//! The client never verifies signatures; that is the backend's job. It only
//! decodes the payload segment to read expiry and scope, and treats any
//! token it cannot decode as already expired.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Claims {
    /// Roles carried in the space-separated `scope` claim.
    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(ToString::to_string)
            .collect()
    }

    /// Whether the token expires within `window` of `now_unix_seconds`.
    /// A token with no `exp` claim counts as expiring.
    #[must_use]
    pub fn expires_within_at(&self, window: Duration, now_unix_seconds: i64) -> bool {
        match self.exp {
            Some(exp) => exp <= now_unix_seconds.saturating_add(window.as_secs() as i64),
            None => true,
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now_unix_seconds: i64) -> bool {
        self.expires_within_at(Duration::ZERO, now_unix_seconds)
    }
}

/// Decode the payload segment of a compact JWT without verifying it.
///
/// # Errors
/// Returns an error if the token is not three dot-separated segments or the
/// payload is not base64url-encoded JSON.
pub fn decode_claims(token: &str) -> Result<Claims, Error> {
    let mut parts = token.split('.');
    let _header = parts.next().ok_or(Error::TokenFormat)?;
    let payload = parts.next().ok_or(Error::TokenFormat)?;
    let _signature = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() {
        return Err(Error::TokenFormat);
    }

    let bytes = Base64UrlUnpadded::decode_vec(payload).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Convenience check against the current clock. An undecodable token is
/// reported as expiring so callers fall back to a refresh.
#[must_use]
pub fn expires_within(token: &str, window: Duration) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.expires_within_at(window, unix_now()),
        Err(_) => true,
    }
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}
