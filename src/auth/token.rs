// JWT token issuing and validation
//
// Staff tokens (admins, representatives) are minted by the identity provider
// sharing the secret. Portal session tokens are minted here after a customer
// or representative identification succeeds.

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{AccessGrant, Actor, ActorKind, PasswordCredential};
use crate::auth::error::AuthError;
use crate::auth::models::Role;
use crate::i18n::Language;
use crate::models::Country;

/// Claims of a staff token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffClaims {
    pub sub: String, // staff id (numeric for admins)
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of a portal session, bound to one campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid, // campaign uuid
    pub customer_number: String,
    pub country: Country,
    pub actor: ActorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_name: Option<String>,
    /// SHA-256 of the campaign password typed at identification (protected mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_digest: Option<String>,
    pub lang: Language,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn actor(&self) -> Actor {
        match (self.actor, &self.rep_id) {
            (ActorKind::Representative, Some(id)) => Actor::Representative {
                id: id.clone(),
                name: self.rep_name.clone().unwrap_or_default(),
            },
            _ => Actor::Customer,
        }
    }

    pub fn password(&self) -> Option<PasswordCredential> {
        self.password_digest.clone().map(PasswordCredential::Digest)
    }
}

/// Token service for JWT operations
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl: i64, // in seconds
}

impl TokenService {
    pub fn new(secret: &str, session_ttl: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> i64 {
        self.session_ttl
    }

    /// Issue a session for a granted identification on `campaign_uuid`
    pub fn issue_session(
        &self,
        campaign_uuid: Uuid,
        grant: &AccessGrant,
        password: Option<&PasswordCredential>,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let (rep_id, rep_name) = match &grant.actor {
            Actor::Representative { id, name } => (Some(id.clone()), Some(name.clone())),
            Actor::Customer => (None, None),
        };

        let claims = SessionClaims {
            sub: campaign_uuid,
            customer_number: grant.customer.customer_number.to_string(),
            country: grant.customer.country,
            actor: grant.actor.kind(),
            rep_id,
            rep_name,
            password_digest: password.map(PasswordCredential::to_digest),
            lang: grant.language,
            iat: now,
            exp: now + self.session_ttl,
        };

        self.sign(&claims)
    }

    /// Mint a staff token; production tokens come from the identity provider
    pub fn issue_staff_token(&self, sub: &str, name: &str, role: Role, ttl: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = StaffClaims {
            sub: sub.to_string(),
            name: name.to_string(),
            role,
            iat: now,
            exp: now + ttl,
        };
        self.sign(&claims)
    }

    pub fn validate_staff_token(&self, token: &str) -> Result<StaffClaims, AuthError> {
        self.validate(token)
    }

    pub fn validate_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.validate(token)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    fn validate<T: DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::{CustomerIdentity, CustomerNumber};
    use proptest::prelude::*;

    const SECRET: &str = "test_secret_key_for_testing_purposes_0123";

    fn test_token_service() -> TokenService {
        TokenService::new(SECRET, 7200)
    }

    fn grant(number: &str, actor: Actor) -> AccessGrant {
        AccessGrant {
            customer: CustomerIdentity {
                customer_number: CustomerNumber::parse(number).unwrap(),
                country: Country::Be,
                name: "Pharmacie du Parc".to_string(),
                representative_id: None,
                representative_name: None,
                cluster: None,
                language: None,
                is_prospect: false,
            },
            language: Language::Nl,
            actor,
        }
    }

    #[test]
    fn test_session_round_trip() {
        let service = test_token_service();
        let campaign = Uuid::new_v4();
        let password = PasswordCredential::Plain("Secret".to_string());

        let token = service
            .issue_session(campaign, &grant("123456", Actor::Customer), Some(&password))
            .unwrap();
        let claims = service.validate_session(&token).unwrap();

        assert_eq!(claims.sub, campaign);
        assert_eq!(claims.customer_number, "123456");
        assert_eq!(claims.country, Country::Be);
        assert_eq!(claims.lang, Language::Nl);
        assert_eq!(claims.exp - claims.iat, 7200);
        assert_eq!(claims.actor(), Actor::Customer);
        assert!(claims.password().unwrap().matches("Secret"));
    }

    #[test]
    fn test_representative_session_keeps_rep() {
        let service = test_token_service();
        let rep = Actor::Representative { id: "R12".to_string(), name: "Jan Peeters".to_string() };

        let token = service.issue_session(Uuid::new_v4(), &grant("E12345-CB", rep.clone()), None).unwrap();
        let claims = service.validate_session(&token).unwrap();

        assert_eq!(claims.actor, ActorKind::Representative);
        assert_eq!(claims.actor(), rep);
        assert!(claims.password_digest.is_none());
    }

    #[test]
    fn test_staff_and_session_tokens_do_not_mix() {
        let service = test_token_service();
        let staff = service.issue_staff_token("7", "Alice", Role::Admin, 600).unwrap();
        let session = service.issue_session(Uuid::new_v4(), &grant("123456", Actor::Customer), None).unwrap();

        assert!(service.validate_session(&staff).is_err());
        assert!(service.validate_staff_token(&session).is_err());
        assert_eq!(service.validate_staff_token(&staff).unwrap().role, Role::Admin);
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let service = test_token_service();
        let token = service.issue_staff_token("7", "Alice", Role::Admin, -3600).unwrap();
        assert!(matches!(service.validate_staff_token(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_token_signature_verification() {
        let service1 = TokenService::new("secret-one-secret-one-secret-one-1", 60);
        let service2 = TokenService::new("secret-two-secret-two-secret-two-2", 60);

        let token = service1.issue_staff_token("1", "Bob", Role::Representative, 60).unwrap();
        assert!(service1.validate_staff_token(&token).is_ok());
        assert!(matches!(service2.validate_staff_token(&token), Err(AuthError::InvalidToken)));
    }

    proptest! {
        #[test]
        fn prop_malformed_tokens_rejected(malformed in "[a-zA-Z0-9.]{0,60}") {
            let service = test_token_service();
            prop_assert!(service.validate_session(&malformed).is_err());
            prop_assert!(service.validate_staff_token(&malformed).is_err());
        }

        #[test]
        fn prop_staff_claims_carry_identity(sub in "[0-9]{1,6}", name in "[A-Za-z ]{1,20}") {
            let service = test_token_service();
            let token = service.issue_staff_token(&sub, &name, Role::Admin, 900)?;
            let claims = service.validate_staff_token(&token)?;
            prop_assert_eq!(claims.sub, sub);
            prop_assert_eq!(claims.name, name);
            prop_assert_eq!(claims.exp - claims.iat, 900);
        }
    }
}
