use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Marker the login endpoint embeds in a 403 message when the account exists
/// but its email address has not been verified yet.
const VERIFY_EMAIL_MARKER: &str = "verify your email";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - session is missing or no longer valid")]
    Unauthorized,

    #[error("{0}")]
    VerificationRequired(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// JSON error envelope the API uses for non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data around
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Best-effort human message for a non-success response: the JSON
    /// `message` field when the body parses, the raw body text otherwise,
    /// and the status's canonical reason phrase as the last resort.
    fn extract_message(status: StatusCode, body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(message) = parsed.message {
                if !message.trim().is_empty() {
                    return Self::truncate_body(message.trim());
                }
            }
        }
        let trimmed = body.trim();
        if !trimmed.is_empty() {
            return Self::truncate_body(trimmed);
        }
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = Self::extract_message(status, body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 if message.to_lowercase().contains(VERIFY_EMAIL_MARKER) => {
                ApiError::VerificationRequired(message)
            }
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "nope"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_forbidden_with_marker_is_verification_required() {
        let body = r#"{"message": "Please verify your email before logging in"}"#;
        match ApiError::from_status(StatusCode::FORBIDDEN, body) {
            ApiError::VerificationRequired(message) => {
                assert!(message.contains("verify your email"));
            }
            other => panic!("expected VerificationRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_marker_detection_is_case_insensitive() {
        let body = r#"{"message": "Verify Your Email to continue"}"#;
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, body),
            ApiError::VerificationRequired(_)
        ));
    }

    #[test]
    fn test_message_extracted_from_json_body() {
        let body = r#"{"message": "Invalid or expired OTP"}"#;
        match ApiError::from_status(StatusCode::BAD_REQUEST, body) {
            ApiError::InvalidResponse(message) => {
                assert!(message.contains("Invalid or expired OTP"));
                assert!(!message.contains('{'));
            }
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_message_falls_back_to_raw_body_then_reason() {
        match ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "upstream down") {
            ApiError::ServerError(message) => assert_eq!(message, "upstream down"),
            other => panic!("expected ServerError, got {:?}", other),
        }
        match ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "") {
            ApiError::ServerError(message) => assert_eq!(message, "Service Unavailable"),
            other => panic!("expected ServerError, got {:?}", other),
        }
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        match ApiError::from_status(StatusCode::BAD_GATEWAY, &body) {
            ApiError::ServerError(message) => {
                assert!(message.len() < body.len());
                assert!(message.contains("truncated"));
            }
            other => panic!("expected ServerError, got {:?}", other),
        }
    }
}
