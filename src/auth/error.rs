// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::fmt;
use tracing::{error, warn};

use crate::auth::models::Role;
use crate::error::ErrorResponse;

/// Authentication and authorization error types
#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
    ExpiredToken,
    MissingToken,
    TokenGenerationError(String),

    /// Staff token with the wrong role for the route
    InsufficientPermissions { required: Role, actual: Role },

    /// Portal session issued for another campaign
    CampaignMismatch,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::ExpiredToken => write!(f, "Token has expired"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
            AuthError::InsufficientPermissions { required, actual } => write!(
                f,
                "Insufficient permissions: required role '{}', but token has role '{}'",
                required, actual
            ),
            AuthError::CampaignMismatch => write!(f, "Session does not belong to this campaign"),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidToken | AuthError::ExpiredToken | AuthError::MissingToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InsufficientPermissions { .. } | AuthError::CampaignMismatch => {
                StatusCode::FORBIDDEN
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::ExpiredToken => "EXPIRED_TOKEN",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::TokenGenerationError(_) => "INTERNAL_ERROR",
            AuthError::InsufficientPermissions { .. } => "FORBIDDEN",
            AuthError::CampaignMismatch => "SESSION_CAMPAIGN_MISMATCH",
        }
    }

    /// Message safe to send to clients
    pub fn error_message(&self) -> String {
        match self {
            AuthError::TokenGenerationError(_) => "Internal server error".to_string(),
            AuthError::InsufficientPermissions { required, .. } => {
                format!("Insufficient permissions: required role '{}'", required)
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            AuthError::InsufficientPermissions { required, actual } => {
                warn!("Authorization failed: required role '{}', token has role '{}'", required, actual)
            }
            other => warn!("Rejected credentials: {}", other),
        }

        let body = ErrorResponse {
            error_code: self.error_code().to_string(),
            message: self.error_message(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::CampaignMismatch.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::InsufficientPermissions { required: Role::Admin, actual: Role::Representative }
                .status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_generation_error_is_not_leaked() {
        let err = AuthError::TokenGenerationError("key material".to_string());
        assert_eq!(err.error_message(), "Internal server error");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
