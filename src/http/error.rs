//! Classified errors produced by interpreting a completed HTTP response.

use reqwest::StatusCode;
use serde::Deserialize;

/// An HTTP response the API answered with, but not with success.
///
/// Transport failures (DNS, connect, TLS, body read) are never turned into an
/// `ApiError`; they surface as the underlying `reqwest::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP 401
    NotAuthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    DataNotFound,
    /// Any other non-2xx status whose body was `{"error": "..."}`.
    Application(String),
    /// Any other non-2xx status without a readable error body.
    HttpNotOk,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotAuthorized => write!(f, "API access not authorized"),
            ApiError::Forbidden => write!(f, "API access forbidden"),
            ApiError::DataNotFound => write!(f, "data not found"),
            // The server's message is shown exactly as sent.
            ApiError::Application(msg) => write!(f, "{}", msg),
            ApiError::HttpNotOk => write!(f, "HTTP status not OK"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Maps the statuses that are rejected before the body is read.
pub fn classify_status(status: StatusCode) -> Option<ApiError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(ApiError::NotAuthorized),
        StatusCode::FORBIDDEN => Some(ApiError::Forbidden),
        StatusCode::NOT_FOUND => Some(ApiError::DataNotFound),
        _ => None,
    }
}

/// Builds the error for a non-2xx response from its body.
pub fn classify_error_body(body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => ApiError::Application(parsed.error),
        Err(_) => ApiError::HttpNotOk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_named_errors() {
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED),
            Some(ApiError::NotAuthorized)
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            Some(ApiError::Forbidden)
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            Some(ApiError::DataNotFound)
        );
    }

    #[test]
    fn test_classify_status_leaves_other_statuses_alone() {
        for status in [
            StatusCode::OK,
            StatusCode::NO_CONTENT,
            StatusCode::BAD_REQUEST,
            StatusCode::CONFLICT,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert_eq!(classify_status(status), None, "status {}", status);
        }
    }

    #[test]
    fn test_classify_error_body_with_message() {
        let err = classify_error_body(br#"{"error":"room alias already in use"}"#);
        assert_eq!(
            err,
            ApiError::Application("room alias already in use".to_string())
        );
        assert_eq!(err.to_string(), "room alias already in use");
    }

    #[test]
    fn test_classify_error_body_unparseable() {
        assert_eq!(classify_error_body(b"<html>oops</html>"), ApiError::HttpNotOk);
        assert_eq!(classify_error_body(b""), ApiError::HttpNotOk);
        assert_eq!(classify_error_body(br#"{"message":"x"}"#), ApiError::HttpNotOk);
    }

    #[test]
    fn test_api_error_display() {
        assert!(ApiError::NotAuthorized.to_string().contains("not authorized"));
        assert!(ApiError::Forbidden.to_string().contains("forbidden"));
        assert!(ApiError::DataNotFound.to_string().contains("not found"));
        assert!(ApiError::HttpNotOk.to_string().contains("not OK"));
    }
}
