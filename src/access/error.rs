use axum::http::StatusCode;
use serde_json::json;
use tracing::{error, warn};

use crate::access::DenyReason;
use crate::auth::AuthError;
use crate::customers::{DirectoryError, InvalidCustomerNumber};
use crate::i18n::{Language, Localize, MSG_CAMPAIGN_NOT_FOUND, MSG_TRY_AGAIN};

/// Failures of the public identification and catalog routes
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Access denied: {0}")]
    Denied(DenyReason),

    #[error("Campaign not found")]
    CampaignNotFound,

    #[error(transparent)]
    InvalidCustomerNumber(#[from] InvalidCustomerNumber),

    #[error("Invalid form: {0}")]
    InvalidForm(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Session error: {0}")]
    Session(#[from] AuthError),
}

impl Localize for AccessError {
    fn status_code(&self) -> StatusCode {
        match self {
            AccessError::Denied(_) => StatusCode::FORBIDDEN,
            AccessError::CampaignNotFound => StatusCode::NOT_FOUND,
            AccessError::InvalidCustomerNumber(_) | AccessError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            AccessError::Directory(DirectoryError::InvalidCountry(_)) => StatusCode::BAD_REQUEST,
            AccessError::Directory(DirectoryError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AccessError::Directory(DirectoryError::DatabaseError(_)) | AccessError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AccessError::Session(e) => e.status_code(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AccessError::Denied(_) => "ACCESS_DENIED",
            AccessError::CampaignNotFound => "CAMPAIGN_NOT_FOUND",
            AccessError::InvalidCustomerNumber(_) => "INVALID_CUSTOMER_NUMBER",
            AccessError::InvalidForm(_) => "VALIDATION_ERROR",
            AccessError::Directory(DirectoryError::InvalidCountry(_)) => "INVALID_COUNTRY",
            AccessError::Directory(DirectoryError::Unavailable(_)) => "SERVICE_UNAVAILABLE",
            AccessError::Directory(DirectoryError::DatabaseError(_)) | AccessError::DatabaseError(_) => {
                "INTERNAL_ERROR"
            }
            AccessError::Session(_) => "SESSION_ERROR",
        }
    }

    fn message(&self, lang: Language) -> String {
        let text = match self {
            AccessError::Denied(reason) => reason.message(lang),
            AccessError::CampaignNotFound => lang.pick(MSG_CAMPAIGN_NOT_FOUND.0, MSG_CAMPAIGN_NOT_FOUND.1),
            AccessError::InvalidCustomerNumber(_) => lang.pick(
                "Le numéro client n'est pas dans un format reconnu.",
                "Het klantnummer heeft geen geldig formaat.",
            ),
            AccessError::InvalidForm(_) => lang.pick(
                "Certains champs du formulaire sont invalides.",
                "Sommige velden van het formulier zijn ongeldig.",
            ),
            AccessError::Directory(DirectoryError::InvalidCountry(_)) => {
                lang.pick("Pays invalide.", "Ongeldig land.")
            }
            _ => lang.pick(MSG_TRY_AGAIN.0, MSG_TRY_AGAIN.1),
        };
        text.to_string()
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AccessError::Denied(reason) => Some(json!({ "reason": reason })),
            AccessError::InvalidForm(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        }
    }

    fn log(&self) {
        match self {
            AccessError::Denied(reason) => warn!("Campaign access denied: {}", reason),
            AccessError::Directory(e) if e.is_infrastructure() => error!("Customer directory failure: {}", e),
            AccessError::DatabaseError(e) => error!("Database error during access check: {:?}", e),
            AccessError::Session(e) => error!("Session issuance failed: {}", e),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_denial_is_localized_with_reason() {
        let err = AccessError::Denied(DenyReason::NotInList);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "ACCESS_DENIED");
        assert_eq!(err.details(), Some(json!({ "reason": "not_in_list" })));
        assert!(err.message(Language::Nl).contains("klantnummer"));
    }

    #[test]
    fn test_directory_outage_is_not_a_denial() {
        let err = AccessError::from(DirectoryError::Unavailable("timeout".into()));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.message(Language::Fr), MSG_TRY_AGAIN.0);
        assert!(err.details().is_none());
    }

    #[test]
    fn test_database_error_hides_details() {
        let response = AccessError::DatabaseError(sqlx::Error::PoolTimedOut)
            .localized(Language::Nl)
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
