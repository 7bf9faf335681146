use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every failed API response: `{"error": "<message>"}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
pub struct ErrorResponse {
    /// Human readable reason for the failure.
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new error response with the given message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.error)
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_error_envelope() {
        let error = ErrorResponse::new("Username already taken");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({ "error": "Username already taken" })
        );
        assert_eq!(error.to_string(), "Username already taken");
    }

    #[test]
    fn deserializes_from_error_envelope() {
        let error: ErrorResponse =
            serde_json::from_str(r#"{"error":"Missing password in request body"}"#).unwrap();
        assert_eq!(error.error, "Missing password in request body");
    }
}
