use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Credentials posted to `POST /api/auth/login`.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    /// Login name. Required.
    pub user_name: Option<String>,
    /// Plain-text password. Required.
    pub password: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Successful login or refresh response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct LoginResponse {
    /// Bearer token to present in the `Authorization` header.
    #[serde(rename = "authToken")]
    pub auth_token: String,
}
