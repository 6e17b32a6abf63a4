use crate::error::ApiError;
use crate::models::Country;

/// Failures of the customer directory collaborator
///
/// "Customer not found" is not an error: lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Customer directory unavailable: {0}")]
    Unavailable(String),

    #[error("No customer directory for country {0}")]
    InvalidCountry(Country),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl DirectoryError {
    /// Whether the failure comes from infrastructure rather than the request
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, DirectoryError::InvalidCountry(_))
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Unavailable(reason) => ApiError::ServiceUnavailable(reason),
            DirectoryError::InvalidCountry(country) => {
                let mut errors = validator::ValidationErrors::new();
                let mut error = validator::ValidationError::new("customer_country");
                error.message = Some(format!("{} has no customer directory", country).into());
                errors.add("country", error);
                ApiError::ValidationError(errors)
            }
            DirectoryError::DatabaseError(e) => ApiError::DatabaseError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_display() {
        let err = DirectoryError::Unavailable("timeout after 5s".to_string());
        assert_eq!(err.to_string(), "Customer directory unavailable: timeout after 5s");
        assert_eq!(
            DirectoryError::InvalidCountry(Country::Both).to_string(),
            "No customer directory for country BOTH"
        );
    }

    #[test]
    fn test_conversion_to_api_error() {
        let unavailable: ApiError = DirectoryError::Unavailable("down".into()).into();
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let invalid: ApiError = DirectoryError::InvalidCountry(Country::Both).into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_infrastructure_classification() {
        assert!(DirectoryError::Unavailable("x".into()).is_infrastructure());
        assert!(DirectoryError::DatabaseError(sqlx::Error::PoolTimedOut).is_infrastructure());
        assert!(!DirectoryError::InvalidCountry(Country::Both).is_infrastructure());
    }
}
