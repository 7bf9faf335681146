/// Login and token refresh.
pub mod auth;
/// Registration and user lookup.
pub mod users;

use crate::http::error::{ApiError, AppResult};

/// Returns the value of a required body field, rejecting absent and empty
/// values with the standard "Missing <field>" message.
fn required<'a>(value: Option<&'a str>, field: &str) -> AppResult<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::missing_field(field)),
    }
}
