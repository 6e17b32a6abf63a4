// Request extractors for staff and portal routes

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{header, request::Parts},
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{error::AuthError, models::Role, token::SessionClaims};
use crate::AppState;

/// Extract the raw token of an `Authorization: Bearer ...` header
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    auth_header.strip_prefix("Bearer ").ok_or(AuthError::InvalidToken)
}

fn require_role(actual: Role, required: Role) -> Result<(), AuthError> {
    if actual == required {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions { required, actual })
    }
}

/// Administrator authenticated by a staff token
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub admin_id: i32,
    pub name: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = state.tokens.validate_staff_token(bearer_token(parts)?)?;
        require_role(claims.role, Role::Admin)?;

        let admin_id = claims.sub.parse::<i32>().map_err(|_| AuthError::InvalidToken)?;
        debug!("Admin {} authenticated for {}", admin_id, parts.uri.path());

        Ok(AdminUser { admin_id, name: claims.name })
    }
}

/// Sales representative authenticated through SSO
#[derive(Debug, Clone)]
pub struct RepresentativeUser {
    pub rep_id: String,
    pub name: String,
}

#[async_trait]
impl FromRequestParts<AppState> for RepresentativeUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = state.tokens.validate_staff_token(bearer_token(parts)?)?;
        require_role(claims.role, Role::Representative)?;

        debug!("Representative {} authenticated for {}", claims.sub, parts.uri.path());
        Ok(RepresentativeUser { rep_id: claims.sub, name: claims.name })
    }
}

/// Portal session of the campaign named by the `:uuid` path segment
#[derive(Debug, Clone)]
pub struct PortalSession(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for PortalSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = state.tokens.validate_session(bearer_token(parts)?)?;

        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::CampaignMismatch)?;
        let campaign_uuid = params
            .get("uuid")
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or(AuthError::CampaignMismatch)?;

        if campaign_uuid != claims.sub {
            return Err(AuthError::CampaignMismatch);
        }

        Ok(PortalSession(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/admin/campaigns");
        if let Some(value) = auth_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def.ghi"))).unwrap(), "abc.def.ghi");
        assert!(matches!(bearer_token(&parts_with(None)), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(&parts_with(Some("Basic abc"))), Err(AuthError::InvalidToken)));
        assert!(matches!(bearer_token(&parts_with(Some("bearer abc"))), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(Role::Admin, Role::Admin).is_ok());
        assert!(matches!(
            require_role(Role::Representative, Role::Admin),
            Err(AuthError::InsufficientPermissions { required: Role::Admin, actual: Role::Representative })
        ));
    }
}
