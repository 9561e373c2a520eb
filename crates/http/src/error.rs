//! Error handling for the shelf HTTP layer

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shelf_kernel::ResourceError;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::{Timestamp, Uuid};

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        code: String,
        message: String,
    },

    #[error("precondition failed: {message}")]
    PreconditionFailed { message: String, code: String },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String, code: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    /// Create a precondition failed error
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
            code: "precondition_failed".to_string(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            code: "unauthorized".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }
}

impl From<ResourceError> for AppError {
    fn from(err: ResourceError) -> Self {
        let message = err.to_string();
        match err {
            ResourceError::NotFound { .. } => Self::not_found(message),
            ResourceError::PreconditionFailed { .. } => Self::precondition_failed(message),
            ResourceError::Validation { fields, .. } => Self::validation(
                fields
                    .iter()
                    .map(|field| json!({"field": field, "error": "required"}))
                    .collect(),
                message,
            ),
            ResourceError::Store(e) => Self::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v7(Timestamp::now(uuid::NoContext));
        let timestamp = OffsetDateTime::now_utc().to_string();

        let (status, error_code, message, details) = match self {
            AppError::Validation {
                details,
                code,
                message,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                code,
                message,
                Some(details),
            ),
            AppError::PreconditionFailed { message, code } => {
                (StatusCode::PRECONDITION_FAILED, code, message, None)
            }
            AppError::NotFound { message, code } => (StatusCode::NOT_FOUND, code, message, None),
            AppError::Unauthorized { message, code } => {
                (StatusCode::UNAUTHORIZED, code, message, None)
            }
            AppError::BadRequest { message, code } => {
                (StatusCode::BAD_REQUEST, code, message, None)
            }
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error".to_string(),
                e.to_string(),
                None,
            ),
        };

        tracing::error!(
            error_id = %error_id,
            error_code = %error_code,
            status_code = %status.as_u16(),
            "Request error"
        );

        // Internal details stay out of release-build responses
        let message = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR
        {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let error_response = json!({
            "error": {
                "code": error_code,
                "message": message,
                "details": details.unwrap_or_default(),
                "trace_id": error_id.to_string(),
                "timestamp": timestamp
            }
        });

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error() {
        let details = vec![serde_json::json!({"field": "title", "error": "required"})];
        let error = AppError::validation(details.clone(), "Validation failed");

        match error {
            AppError::Validation {
                details: d,
                code,
                message,
            } => {
                assert_eq!(d, details);
                assert_eq!(code, "validation_error");
                assert_eq!(message, "Validation failed");
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_resource_errors_map_to_statuses() {
        let cases = [
            (
                ResourceError::NotFound { kind: "Book", id: 4 },
                StatusCode::NOT_FOUND,
            ),
            (
                ResourceError::PreconditionFailed { kind: "Book" },
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                ResourceError::Validation {
                    kind: "Book",
                    fields: vec!["isbn"],
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ResourceError::Store(anyhow::anyhow!("disk gone")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[tokio::test]
    async fn test_not_found_body_names_the_resource() {
        let error = AppError::from(ResourceError::NotFound { kind: "User", id: 9 });
        let body = body_json(error.into_response()).await;

        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "User 9 not found");
    }

    #[tokio::test]
    async fn test_validation_body_lists_missing_fields() {
        let error = AppError::from(ResourceError::Validation {
            kind: "Book",
            fields: vec!["author", "isbn"],
        });
        let body = body_json(error.into_response()).await;

        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(
            body["error"]["details"],
            serde_json::json!([
                {"field": "author", "error": "required"},
                {"field": "isbn", "error": "required"}
            ])
        );
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let error = AppError::precondition_failed("ids differ");
        let body = body_json(error.into_response()).await;

        let trace_id = body["error"]["trace_id"].as_str().unwrap();
        assert!(Uuid::parse_str(trace_id).is_ok());
        assert!(body["error"]["timestamp"].is_string());
        assert_eq!(body["error"]["code"], "precondition_failed");
        assert_eq!(body["error"]["details"], serde_json::json!([]));
    }
}
