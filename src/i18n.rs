// Localization helpers for customer-facing responses
// Customers read the portal in French or Dutch; admin endpoints stay in English.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ErrorResponse;

/// Display language of the customer portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Fr,
    Nl,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::Nl => "nl",
        }
    }

    /// Lenient parse used for directory values and query strings ("FR", "nl-BE", ...)
    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.trim().to_ascii_lowercase();
        if lowered.starts_with("fr") {
            Some(Language::Fr)
        } else if lowered.starts_with("nl") {
            Some(Language::Nl)
        } else {
            None
        }
    }

    /// Pick the French or Dutch variant of a text
    pub fn pick<'a>(&self, fr: &'a str, nl: &'a str) -> &'a str {
        match self {
            Language::Fr => fr,
            Language::Nl => nl,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Fr
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can be rendered to a portal user in their own language
pub trait Localize {
    fn status_code(&self) -> StatusCode;

    /// Machine-readable code, stable across languages
    fn error_code(&self) -> &'static str;

    fn message(&self, lang: Language) -> String;

    fn details(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called once before rendering so infrastructure failures reach the logs
    fn log(&self) {}

    fn localized(self, lang: Language) -> Localized<Self>
    where
        Self: Sized,
    {
        Localized { error: self, lang }
    }
}

/// A portal error bound to the language it must be rendered in
#[derive(Debug)]
pub struct Localized<E> {
    pub error: E,
    pub lang: Language,
}

impl<E: Localize> IntoResponse for Localized<E> {
    fn into_response(self) -> Response {
        self.error.log();

        let body = ErrorResponse {
            error_code: self.error.error_code().to_string(),
            message: self.error.message(self.lang),
            details: self.error.details(),
            timestamp: Utc::now().to_rfc3339(),
        };

        (self.error.status_code(), Json(body)).into_response()
    }
}

pub(crate) const MSG_TRY_AGAIN: (&str, &str) = (
    "Une erreur est survenue, veuillez réessayer dans quelques instants.",
    "Er is een fout opgetreden, probeer het over enkele ogenblikken opnieuw.",
);

pub(crate) const MSG_CAMPAIGN_NOT_FOUND: (&str, &str) =
    ("Campagne introuvable.", "Campagne niet gevonden.");
