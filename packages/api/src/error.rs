// ABOUTME: API error type with machine-readable codes and sanitised messages
// ABOUTME: Maps storage, validation, timeline and integration errors onto HTTP responses

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use porchlight_core::{FieldError, ValidationError};
use porchlight_integrations::IntegrationError;
use porchlight_storage::StorageError;
use porchlight_timeline::TimelineError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Error type returned by every handler and middleware
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: u64, limit: u32 },

    #[error("{0} is not configured")]
    ServiceUnavailable(&'static str),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
    request_id: String,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl AppError {
    fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::InvalidTransition(_) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::RateLimitExceeded { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            AppError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Message safe to show to a visitor
    fn to_user_message(&self) -> String {
        match self {
            AppError::Validation(err) => format!("Validation failed: {}", err),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound(what) => format!("{} not found", what),
            AppError::Conflict(msg) => msg.clone(),
            AppError::InvalidTransition(msg) => msg.clone(),
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::RateLimitExceeded { .. } => {
                "Too many requests. Please try again later".to_string()
            }
            AppError::ServiceUnavailable(service) => {
                format!("The {} service is not available right now", service)
            }
            AppError::Upstream(_) => "An external service request failed".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    pub fn rate_limited(retry_after: u64, limit: u32) -> Self {
        Self::RateLimitExceeded { retry_after, limit }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => AppError::NotFound(what),
            StorageError::Duplicate(what) => AppError::Conflict(format!("{} already exists", what)),
            StorageError::Validation(err) => AppError::Validation(err),
            err @ StorageError::InvalidTransition { .. } => {
                AppError::InvalidTransition(err.to_string())
            }
            StorageError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<TimelineError> for AppError {
    fn from(err: TimelineError) -> Self {
        AppError::Validation(ValidationError::from(err))
    }
}

impl From<IntegrationError> for AppError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::NotConfigured(service) => AppError::ServiceUnavailable(service),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status_code, error_code) = self.to_status_and_code();
        let user_message = self.to_user_message();

        match &self {
            AppError::Internal(err) => {
                error!(
                    request_id = %request_id,
                    error = %err,
                    "Internal server error occurred"
                );
            }
            AppError::Upstream(msg) => {
                warn!(
                    request_id = %request_id,
                    upstream_error = %msg,
                    "External service call failed"
                );
            }
            AppError::RateLimitExceeded { retry_after, .. } => {
                warn!(
                    request_id = %request_id,
                    retry_after = %retry_after,
                    audit = true,
                    "Rate limit exceeded"
                );
            }
            _ => {
                info!(
                    request_id = %request_id,
                    error_code = %error_code,
                    error = %self,
                    "API error response"
                );
            }
        }

        let details = match &self {
            AppError::Validation(err) => Some(err.errors.clone()),
            _ => None,
        };
        let retry_after = match &self {
            AppError::RateLimitExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: error_code,
                message: user_message,
                retry_after,
                details,
            },
            request_id,
        };

        let mut response = (status_code, Json(body)).into_response();

        if let AppError::RateLimitExceeded { retry_after, limit } = &self {
            let headers = response.headers_mut();
            headers.insert(RETRY_AFTER, HeaderValue::from(*retry_after));
            headers.insert("x-ratelimit-limit", HeaderValue::from(*limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
            headers.insert("x-ratelimit-reset", HeaderValue::from(*retry_after));
        }

        response
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_storage_errors_map_to_statuses() {
        let cases = [
            (StorageError::not_found("Lead lead-1"), StatusCode::NOT_FOUND),
            (StorageError::Duplicate("link code 'spring'".into()), StatusCode::CONFLICT),
            (StorageError::Conflict("running".into()), StatusCode::CONFLICT),
            (
                StorageError::InvalidTransition {
                    entity: "lead",
                    from: "closed".into(),
                    to: "new".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                StorageError::Database("locked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let (status, _) = AppError::from(err).to_status_and_code();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_integration_not_configured_is_503() {
        let err = AppError::from(IntegrationError::NotConfigured("pdf"));
        let (status, code) = err.to_status_and_code();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn test_user_message_sanitization() {
        let err = AppError::internal(anyhow::anyhow!("disk I/O error at /var/lib/secret.db"));
        let message = err.to_user_message();
        assert_eq!(message, "An internal server error occurred");
        assert!(!message.contains("secret"));

        let upstream = AppError::Upstream("crm returned 401: bad key sk_live_123".into());
        assert!(!upstream.to_user_message().contains("sk_live"));
    }

    #[tokio::test]
    async fn test_validation_response_lists_fields() {
        let err = AppError::from(ValidationError::single("email", "is not a valid email"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["details"][0]["field"], "email");
        assert!(json["request_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_rate_limit_sets_headers() {
        let response = AppError::rate_limited(12, 5).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "12");
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");

        let json = body_json(response).await;
        assert_eq!(json["error"]["retry_after"], 12);
    }
}
