use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::auth::{AuthError, SessionClaims};
use crate::customers::{CustomerIdentity, CustomerNumber};
use crate::i18n::Language;
use crate::models::Country;

/// Why a customer may not open a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NotOpen,
    CountryMismatch,
    NotInList,
    BadPassword,
    CustomerNotFound,
    ProspectsNotAllowed,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NotOpen => "not_open",
            DenyReason::CountryMismatch => "country_mismatch",
            DenyReason::NotInList => "not_in_list",
            DenyReason::BadPassword => "bad_password",
            DenyReason::CustomerNotFound => "customer_not_found",
            DenyReason::ProspectsNotAllowed => "prospects_not_allowed",
        }
    }

    pub fn message(&self, lang: Language) -> &'static str {
        match self {
            DenyReason::NotOpen => lang.pick(
                "Cette campagne n'est pas ouverte aux commandes.",
                "Deze campagne staat niet open voor bestellingen.",
            ),
            DenyReason::CountryMismatch => lang.pick(
                "Cette campagne n'est pas disponible dans votre pays.",
                "Deze campagne is niet beschikbaar in uw land.",
            ),
            DenyReason::NotInList => lang.pick(
                "Votre numéro client ne fait pas partie de cette campagne.",
                "Uw klantnummer maakt geen deel uit van deze campagne.",
            ),
            DenyReason::BadPassword => lang.pick("Mot de passe incorrect.", "Onjuist wachtwoord."),
            DenyReason::CustomerNotFound => {
                lang.pick("Numéro client inconnu.", "Onbekend klantnummer.")
            }
            DenyReason::ProspectsNotAllowed => lang.pick(
                "Cette campagne n'est pas ouverte aux nouveaux clients.",
                "Deze campagne staat niet open voor nieuwe klanten.",
            ),
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who drives the portal session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Customer,
    Representative,
}

/// The caller behind an access request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Customer,
    Representative { id: String, name: String },
}

impl Actor {
    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Customer => ActorKind::Customer,
            Actor::Representative { .. } => ActorKind::Representative,
        }
    }
}

/// Shared campaign password as supplied by the caller
///
/// Identification forms carry the typed password; portal sessions carry only
/// its SHA-256 digest so later re-checks can still compare against the
/// campaign's current password.
#[derive(Clone, PartialEq, Eq)]
pub enum PasswordCredential {
    Plain(String),
    Digest(String),
}

impl PasswordCredential {
    /// Lowercase hex SHA-256 of a password
    pub fn digest_of(password: &str) -> String {
        format!("{:x}", Sha256::digest(password.as_bytes()))
    }

    /// Exact, case-sensitive comparison with the campaign password
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            PasswordCredential::Plain(password) => password == expected,
            PasswordCredential::Digest(digest) => *digest == Self::digest_of(expected),
        }
    }

    pub fn to_digest(&self) -> String {
        match self {
            PasswordCredential::Plain(password) => Self::digest_of(password),
            PasswordCredential::Digest(digest) => digest.clone(),
        }
    }
}

impl std::fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordCredential::Plain(_) => f.write_str("Plain(<redacted>)"),
            PasswordCredential::Digest(_) => f.write_str("Digest(<redacted>)"),
        }
    }
}

/// Everything the resolver needs to decide on one campaign
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub customer_number: CustomerNumber,
    pub country: Country,
    pub password: Option<PasswordCredential>,
    pub language: Option<Language>,
    pub actor: Actor,
}

impl AccessRequest {
    /// Rebuild the request a portal session was granted for, to re-check it
    pub fn from_session(claims: &SessionClaims) -> Result<Self, AuthError> {
        let customer_number = CustomerNumber::parse(&claims.customer_number).map_err(|_| AuthError::InvalidToken)?;
        Ok(Self {
            customer_number,
            country: claims.country,
            password: claims.password(),
            language: Some(claims.lang),
            actor: claims.actor(),
        })
    }
}

/// Successful resolution: who is ordering, and in which language
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub customer: CustomerIdentity,
    pub language: Language,
    pub actor: Actor,
}

#[derive(Debug, Clone)]
pub enum AccessDecision {
    Allow(AccessGrant),
    Deny(DenyReason),
}

/// Body of POST /c/{uuid} and POST /c/{uuid}/rep/identify
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IdentifyRequest {
    #[schema(example = "E12345-CB")]
    pub customer_number: String,
    pub country: Country,
    pub password: Option<String>,
    pub lang: Option<Language>,
}

/// Session handed out after a successful identification
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentifyResponse {
    pub session_token: String,
    pub expires_in: i64,
    pub actor: ActorKind,
    pub language: Language,
    pub customer: CustomerIdentity,
}

/// Optional `?lang=` on public pages
#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    pub lang: Option<String>,
}

impl LanguageQuery {
    pub fn language(&self) -> Language {
        self.lang.as_deref().and_then(Language::parse).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_password_is_case_sensitive() {
        let credential = PasswordCredential::Plain("Printemps2026".to_string());
        assert!(credential.matches("Printemps2026"));
        assert!(!credential.matches("printemps2026"));
        assert!(!credential.matches("Printemps2026 "));
    }

    #[test]
    fn test_digest_matches_same_password_only() {
        let digest = PasswordCredential::Plain("Printemps2026".to_string()).to_digest();
        assert_eq!(digest.len(), 64);

        let credential = PasswordCredential::Digest(digest);
        assert!(credential.matches("Printemps2026"));
        assert!(!credential.matches("Zomer2026"));
    }

    #[test]
    fn test_debug_never_prints_password() {
        let credential = PasswordCredential::Plain("hunter2".to_string());
        assert!(!format!("{:?}", credential).contains("hunter2"));
    }

    #[test]
    fn test_deny_reason_codes_and_messages() {
        assert_eq!(serde_json::to_string(&DenyReason::NotInList).unwrap(), "\"not_in_list\"");
        assert_eq!(DenyReason::BadPassword.message(Language::Nl), "Onjuist wachtwoord.");
        assert_eq!(DenyReason::CustomerNotFound.message(Language::Fr), "Numéro client inconnu.");
    }

    #[test]
    fn test_language_query_defaults_to_french() {
        assert_eq!(LanguageQuery::default().language(), Language::Fr);
        assert_eq!(LanguageQuery { lang: Some("nl".into()) }.language(), Language::Nl);
        assert_eq!(LanguageQuery { lang: Some("en".into()) }.language(), Language::Fr);
    }
}
