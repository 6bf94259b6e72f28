use serde_json::Value;
use thiserror::Error;
use worker::Error as WorkerError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
        body: Value,
    },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid wizard action: {0}")]
    InvalidStep(String),
    #[error("A submission is already in flight")]
    SubmissionInFlight,
}

impl AppError {
    /// Builds an API error from a non-success response body.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let body: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        AppError::Api {
            status,
            message: extract_server_message(&body),
            body,
        }
    }

    /// Text shown to the user, preferring whatever the server said.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            AppError::Validation(message) => message.clone(),
            AppError::Unauthorized(message) => message.clone(),
            AppError::Transport(message) if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
            || matches!(self, AppError::Api { status: 401 | 403, .. })
    }

    /// Raw server body, when the failure came from the API.
    pub fn body(&self) -> Option<&Value> {
        match self {
            AppError::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Best-effort extraction of a human-readable message from a server error body.
///
/// Order: `detail`, `message`, `error`, then the first entry of the first
/// field-error list (`{"email": ["..."]}`).
pub fn extract_server_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;

    for key in ["detail", "message", "error"] {
        if let Some(text) = object.get(key).and_then(Value::as_str) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    object.values().find_map(|value| match value {
        Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_wins_over_other_keys() {
        let body = json!({ "detail": "Invalid credentials", "error": "other" });
        assert_eq!(
            extract_server_message(&body).as_deref(),
            Some("Invalid credentials")
        );
    }

    #[test]
    fn falls_back_to_field_errors() {
        let body = json!({ "email": ["Enter a valid email address."] });
        assert_eq!(
            extract_server_message(&body).as_deref(),
            Some("Enter a valid email address.")
        );
    }

    #[test]
    fn non_json_body_uses_fallback() {
        let err = AppError::from_response(500, b"<html>oops</html>");
        assert_eq!(err.user_message("Failed to create capsule"), "Failed to create capsule");
    }

    #[test]
    fn unauthorized_status_is_recognized() {
        assert!(AppError::from_response(401, b"{}").is_unauthorized());
        assert!(!AppError::from_response(400, b"{}").is_unauthorized());
    }
}
