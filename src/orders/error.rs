use axum::http::StatusCode;
use serde_json::json;
use tracing::{error, warn};

use crate::access::DenyReason;
use crate::auth::AuthError;
use crate::customers::DirectoryError;
use crate::i18n::{Language, Localize, MSG_CAMPAIGN_NOT_FOUND, MSG_TRY_AGAIN};
use crate::orders::QuotaScope;

/// Rejections of the checkout preview and the order admission pipeline
///
/// Nothing is persisted when any of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Access denied: {0}")]
    Denied(DenyReason),

    #[error("Campaign not found")]
    CampaignNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Unknown or inactive product: {0}")]
    InvalidProduct(String),

    #[error("Invalid quantity for product {0}")]
    QuantityInvalid(String),

    #[error("Terms and final-order acknowledgement are required")]
    TermsNotAccepted,

    #[error("Invalid form: {0}")]
    InvalidForm(#[from] validator::ValidationErrors),

    #[error("Quota exceeded ({0})")]
    QuotaExceeded(QuotaScope),

    #[error("Submission key already used by another customer")]
    SubmissionConflict,

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Session error: {0}")]
    Session(#[from] AuthError),
}

impl Localize for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrderError::Denied(_) => StatusCode::FORBIDDEN,
            OrderError::CampaignNotFound | OrderError::OrderNotFound => StatusCode::NOT_FOUND,
            OrderError::EmptyCart
            | OrderError::InvalidProduct(_)
            | OrderError::QuantityInvalid(_)
            | OrderError::TermsNotAccepted
            | OrderError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            OrderError::QuotaExceeded(_) | OrderError::SubmissionConflict => StatusCode::CONFLICT,
            OrderError::Directory(DirectoryError::InvalidCountry(_)) => StatusCode::BAD_REQUEST,
            OrderError::Directory(DirectoryError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            OrderError::Directory(DirectoryError::DatabaseError(_)) | OrderError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            OrderError::Session(e) => e.status_code(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            OrderError::Denied(_) => "ACCESS_DENIED",
            OrderError::CampaignNotFound => "CAMPAIGN_NOT_FOUND",
            OrderError::OrderNotFound => "ORDER_NOT_FOUND",
            OrderError::EmptyCart => "EMPTY_CART",
            OrderError::InvalidProduct(_) => "INVALID_PRODUCT",
            OrderError::QuantityInvalid(_) => "QUANTITY_INVALID",
            OrderError::TermsNotAccepted => "TERMS_NOT_ACCEPTED",
            OrderError::InvalidForm(_) => "VALIDATION_ERROR",
            OrderError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            OrderError::SubmissionConflict => "SUBMISSION_CONFLICT",
            OrderError::Directory(DirectoryError::InvalidCountry(_)) => "INVALID_COUNTRY",
            OrderError::Directory(DirectoryError::Unavailable(_)) => "SERVICE_UNAVAILABLE",
            OrderError::Directory(DirectoryError::DatabaseError(_)) | OrderError::DatabaseError(_) => {
                "INTERNAL_ERROR"
            }
            OrderError::Session(_) => "SESSION_ERROR",
        }
    }

    fn message(&self, lang: Language) -> String {
        let text = match self {
            OrderError::Denied(reason) => reason.message(lang),
            OrderError::CampaignNotFound => lang.pick(MSG_CAMPAIGN_NOT_FOUND.0, MSG_CAMPAIGN_NOT_FOUND.1),
            OrderError::OrderNotFound => lang.pick("Commande introuvable.", "Bestelling niet gevonden."),
            OrderError::EmptyCart => lang.pick("Votre panier est vide.", "Uw winkelmandje is leeg."),
            OrderError::InvalidProduct(_) => lang.pick(
                "Un des produits n'est plus disponible dans cette campagne.",
                "Een van de producten is niet meer beschikbaar in deze campagne.",
            ),
            OrderError::QuantityInvalid(_) => lang.pick(
                "La quantité demandée pour un produit n'est pas autorisée.",
                "De gevraagde hoeveelheid voor een product is niet toegestaan.",
            ),
            OrderError::TermsNotAccepted => lang.pick(
                "Veuillez accepter les conditions et confirmer que la commande est définitive.",
                "Gelieve de voorwaarden te aanvaarden en te bevestigen dat de bestelling definitief is.",
            ),
            OrderError::InvalidForm(_) => lang.pick(
                "Certains champs du formulaire sont invalides.",
                "Sommige velden van het formulier zijn ongeldig.",
            ),
            OrderError::QuotaExceeded(QuotaScope::Global) => lang.pick(
                "Le quota de cette campagne est atteint : votre commande ne peut pas être honorée entièrement.",
                "Het quotum van deze campagne is bereikt: uw bestelling kan niet volledig worden uitgevoerd.",
            ),
            OrderError::QuotaExceeded(QuotaScope::PerCustomer) => lang.pick(
                "Vous avez atteint votre quota pour cette campagne : votre commande ne peut pas être honorée entièrement.",
                "U hebt uw quotum voor deze campagne bereikt: uw bestelling kan niet volledig worden uitgevoerd.",
            ),
            OrderError::SubmissionConflict => lang.pick(
                "Cette commande a déjà été soumise.",
                "Deze bestelling werd al verzonden.",
            ),
            OrderError::Directory(DirectoryError::InvalidCountry(_)) => {
                lang.pick("Pays invalide.", "Ongeldig land.")
            }
            OrderError::Session(_) => lang.pick(
                "Votre session a expiré, veuillez vous identifier à nouveau.",
                "Uw sessie is verlopen, gelieve u opnieuw aan te melden.",
            ),
            _ => lang.pick(MSG_TRY_AGAIN.0, MSG_TRY_AGAIN.1),
        };
        text.to_string()
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            OrderError::Denied(reason) => Some(json!({ "reason": reason })),
            OrderError::InvalidProduct(code) | OrderError::QuantityInvalid(code) => {
                Some(json!({ "product_code": code }))
            }
            OrderError::QuotaExceeded(scope) => Some(json!({ "scope": scope })),
            OrderError::InvalidForm(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        }
    }

    fn log(&self) {
        match self {
            OrderError::Denied(reason) => warn!("Order access denied: {}", reason),
            OrderError::QuotaExceeded(scope) => warn!("Order rejected, {} quota exceeded", scope),
            OrderError::SubmissionConflict => warn!("Submission key reused by another customer"),
            OrderError::Directory(e) if e.is_infrastructure() => error!("Customer directory failure: {}", e),
            OrderError::DatabaseError(e) => error!("Database error during admission: {:?}", e),
            _ => {}
        }
    }
}
