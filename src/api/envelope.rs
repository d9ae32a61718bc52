//! The response envelope every backend endpoint wraps its payload in.

use serde::Deserialize;

/// Application-level success code. Anything else in `code` is a handled
/// backend failure even when the HTTP status is 200.
pub const CODE_SUCCESS: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == CODE_SUCCESS
    }
}

/// Token material returned by `/auth/login` and `/auth/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}
