use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Public projection of a registered user. Never carries the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct User {
    /// Identifier assigned by the database.
    pub id: i64,

    /// Unique login name.
    pub user_name: String,

    /// Display name.
    pub full_name: String,

    /// Optional nickname, empty when none was given.
    pub nickname: String,

    /// When the account was created (RFC 3339, UTC).
    pub date_created: DateTime<Utc>,
}

/// Registration payload for `POST /api/users`.
///
/// Every field is optional on the wire so that absent values can be reported
/// with a precise message instead of a generic deserialization failure.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(default)]
pub struct RegisterUserRequest {
    /// Unique login name. Required.
    pub user_name: Option<String>,
    /// Display name. Required.
    pub full_name: Option<String>,
    /// Plain-text password, checked against the password policy. Required.
    pub password: Option<String>,
    /// Optional nickname; an empty string is treated as absent.
    pub nickname: Option<String>,
}

impl fmt::Debug for RegisterUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterUserRequest")
            .field("user_name", &self.user_name)
            .field("full_name", &self.full_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("nickname", &self.nickname)
            .finish()
    }
}
