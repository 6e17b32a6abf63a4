// Error handling for the admin surface of the portal
// Customer-facing errors are localized separately (see i18n.rs)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

/// Main error type for admin handlers
///
/// Each variant maps to a specific HTTP status code and error response format.
#[derive(Debug)]
pub enum ApiError {
    /// Request validation failed
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Duplicate resource conflict (e.g. product code already used in the campaign)
    /// Maps to HTTP 409 Conflict
    Conflict { message: String },

    /// Database operation errors
    /// Maps to HTTP 500, details stay in the logs
    DatabaseError(sqlx::Error),

    /// A required collaborator (customer directory) could not be reached
    /// Maps to HTTP 503 Service Unavailable
    ServiceUnavailable(String),

    /// Internal server errors
    /// Maps to HTTP 500, details stay in the logs
    InternalError(String),

    /// Missing or invalid credentials
    /// Maps to HTTP 401 Unauthorized
    Unauthorized(String),

    /// Authenticated but not allowed
    /// Maps to HTTP 403 Forbidden
    Forbidden(String),
}

/// JSON body shared by every error response of the service
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "VALIDATION_ERROR", "QUOTA_EXCEEDED")
    pub error_code: String,

    /// Human-readable message
    pub message: String,

    /// Optional structured details, omitted when empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of the failure
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        let (error_code, message, details) = match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (
                    "VALIDATION_ERROR",
                    "Request validation failed".to_string(),
                    Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({}))),
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                ("NOT_FOUND", format!("{} with id {} not found", resource, id), None)
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                ("CONFLICT", message.clone(), None)
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                ("DATABASE_ERROR", "A database error occurred".to_string(), None)
            }
            ApiError::ServiceUnavailable(reason) => {
                error!("Collaborator unavailable: {}", reason);
                (
                    "SERVICE_UNAVAILABLE",
                    "A required service is temporarily unavailable".to_string(),
                    None,
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                ("INTERNAL_ERROR", "An internal server error occurred".to_string(), None)
            }
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized access attempt: {}", message);
                ("UNAUTHORIZED", message.clone(), None)
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                ("FORBIDDEN", message.clone(), None)
            }
        };

        (
            self.status_code(),
            ErrorResponse {
                error_code: error_code.to_string(),
                message,
                details,
                timestamp: Utc::now().to_rfc3339(),
            },
        )
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

/// Convert sqlx errors to ApiError, mapping unique violations to conflicts
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                return ApiError::Conflict {
                    message: "A record with the same unique key already exists".to_string(),
                };
            }
        }
        ApiError::DatabaseError(error)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::not_found("Campaign", 3).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::ServiceUnavailable("directory".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_error_hides_details() {
        let (_, body) = ApiError::DatabaseError(sqlx::Error::PoolTimedOut).to_error_response();
        assert_eq!(body.error_code, "DATABASE_ERROR");
        assert!(!body.message.contains("PoolTimedOut"));
    }

    #[test]
    fn test_not_found_message_names_resource() {
        let (status, body) = ApiError::not_found("Campaign", 42).to_error_response();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Campaign with id 42 not found");
        assert!(body.details.is_none());
    }
}
