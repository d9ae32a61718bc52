//! Error taxonomy for backend calls.
//!
//! Only one case is ever recovered silently: a 401 on a protected endpoint
//! that a token refresh repairs. Everything else is classified here, logged
//! once at the call site, and re-raised to the caller.

use crate::api::envelope::ApiResponse;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthenticated")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("server error ({status})")]
    Server { status: u16 },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{message} (code {code})")]
    Backend { code: i64, message: String },
    #[error("no stored credentials")]
    NotAuthenticated,
    #[error(transparent)]
    Refresh(#[from] RefreshFailed),
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
    #[error("invalid response body")]
    Decode(#[from] serde_json::Error),
    #[error("credential store error")]
    Store(#[from] std::io::Error),
}

/// The failure a refresh leader hands to every queued follower. Kept as a
/// flat, cloneable reason so one outcome can reject N waiters.
#[derive(Debug, Clone, Error)]
#[error("token refresh failed: {reason}")]
pub struct RefreshFailed {
    pub reason: String,
}

impl RefreshFailed {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ApiError {
    /// Flatten any error into the shape followers receive.
    #[must_use]
    pub fn as_refresh_failure(&self) -> RefreshFailed {
        match self {
            Self::Refresh(failed) => failed.clone(),
            other => RefreshFailed::new(other.to_string()),
        }
    }

    /// Generic notice for user display, per the storefront's copy.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized | Self::NotAuthenticated | Self::Refresh(_) => {
                "Your session has expired, please log in again".to_string()
            }
            Self::Forbidden => "You do not have permission to do this".to_string(),
            Self::NotFound => "The requested resource was not found".to_string(),
            Self::Server { .. } => "Server error, please try again later".to_string(),
            Self::Network(_) => "Cannot reach the server".to_string(),
            Self::Backend { message, .. } if !message.is_empty() => message.clone(),
            Self::Backend { .. } | Self::InvalidUrl(_) | Self::Decode(_) | Self::Store(_) => {
                "Something went wrong".to_string()
            }
        }
    }
}

/// Map a failed response onto the taxonomy. For plain 4xx errors the
/// backend-provided `message` field wins, with a generic fallback when the
/// body is not a well-formed envelope.
pub(crate) async fn classify_response(response: reqwest::Response) -> ApiError {
    let status = response.status();

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        status if status.is_server_error() => ApiError::Server {
            status: status.as_u16(),
        },
        status => {
            let (code, message) = match response.json::<ApiResponse<serde_json::Value>>().await {
                Ok(envelope) if !envelope.message.is_empty() => (envelope.code, envelope.message),
                Ok(envelope) => (envelope.code, "request failed".to_string()),
                Err(_) => (0, "request failed".to_string()),
            };
            ApiError::Backend {
                code,
                message: format!("{message} ({status})"),
            }
        }
    }
}
