use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Error types for campaign administration
#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    #[error("Campaign {0} not found")]
    NotFound(i32),

    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<CampaignError> for ApiError {
    fn from(err: CampaignError) -> Self {
        match err {
            CampaignError::NotFound(id) => ApiError::not_found("Campaign", id),
            CampaignError::ValidationError(errors) => ApiError::ValidationError(errors),
            CampaignError::DatabaseError(e) => ApiError::from(e),
        }
    }
}

impl IntoResponse for CampaignError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_maps_to_api_status() {
        assert_eq!(ApiError::from(CampaignError::NotFound(9)).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(CampaignError::ValidationError(validator::ValidationErrors::new())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CampaignError::DatabaseError(sqlx::Error::PoolTimedOut).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
