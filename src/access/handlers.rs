// HTTP handlers for the public identification routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::access::{
    check_open_and_country, check_password, AccessDecision, AccessError, AccessGrant, AccessRequest, Actor,
    DenyReason, IdentifyRequest, IdentifyResponse, LanguageQuery, PasswordCredential,
};
use crate::auth::RepresentativeUser;
use crate::campaigns::{today, AssignmentMode, Campaign, PublicCampaign};
use crate::customers::{CustomerNumber, ProspectRegistration};
use crate::i18n::{Language, Localize, Localized};
use crate::AppState;

/// Representative entry page: the campaign plus the price display flag
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct RepresentativeLanding {
    #[serde(flatten)]
    pub campaign: PublicCampaign,
    pub show_prices: bool,
    pub representative_name: String,
}

async fn load_campaign(state: &AppState, uuid: Uuid) -> Result<Campaign, AccessError> {
    state
        .campaigns
        .find_by_uuid(uuid)
        .await?
        .ok_or(AccessError::CampaignNotFound)
}

async fn resolve(
    state: &AppState,
    campaign: &Campaign,
    request: &AccessRequest,
) -> Result<AccessGrant, AccessError> {
    match state.access.resolve(campaign, request, today()).await? {
        AccessDecision::Allow(grant) => Ok(grant),
        AccessDecision::Deny(reason) => Err(AccessError::Denied(reason)),
    }
}

/// Cache the identity and issue the portal session for a granted request
///
/// Only protected campaigns carry the password digest in the session.
async fn grant_session(
    state: &AppState,
    campaign: &Campaign,
    grant: AccessGrant,
    password: Option<&PasswordCredential>,
) -> Result<IdentifyResponse, AccessError> {
    if let Err(e) = state.customers.upsert_identity(&grant.customer).await {
        tracing::warn!("Could not cache customer {}: {}", grant.customer.customer_number, e);
    }

    let password = password.filter(|_| campaign.customer_assignment_mode == AssignmentMode::Protected);
    let session_token = state.tokens.issue_session(campaign.uuid, &grant, password)?;

    tracing::info!(
        "Session opened on campaign {} for {} ({:?})",
        campaign.uuid,
        grant.customer.customer_number,
        grant.actor.kind()
    );

    Ok(IdentifyResponse {
        session_token,
        expires_in: state.tokens.session_ttl(),
        actor: grant.actor.kind(),
        language: grant.language,
        customer: grant.customer,
    })
}

async fn identify(
    state: &AppState,
    uuid: Uuid,
    request: IdentifyRequest,
    actor: Actor,
) -> Result<IdentifyResponse, AccessError> {
    let campaign = load_campaign(state, uuid).await?;
    let password = request.password.map(PasswordCredential::Plain);

    let access = AccessRequest {
        customer_number: CustomerNumber::parse(&request.customer_number)?,
        country: request.country,
        password: password.clone(),
        language: request.lang,
        actor,
    };

    let grant = resolve(state, &campaign, &access).await?;
    grant_session(state, &campaign, grant, password.as_ref()).await
}

/// Handler for GET /c/{uuid}
/// Public landing data; never exposes the password, the list or the internal name
#[utoipa::path(
    get,
    path = "/c/{uuid}",
    params(
        ("uuid" = Uuid, Path, description = "Public campaign identifier"),
        ("lang" = Option<String>, Query, description = "fr or nl")
    ),
    responses(
        (status = 200, description = "Campaign landing data", body = PublicCampaign),
        (status = 404, description = "Unknown campaign", body = ErrorResponse)
    ),
    tag = "portal"
)]
pub async fn landing_handler(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<PublicCampaign>, Localized<AccessError>> {
    let lang = query.language();
    let campaign = load_campaign(&state, uuid).await.map_err(|e| e.localized(lang))?;
    Ok(Json(PublicCampaign::from_campaign(&campaign, lang, today())))
}

/// Handler for POST /c/{uuid}
/// Customer identification
#[utoipa::path(
    post,
    path = "/c/{uuid}",
    params(("uuid" = Uuid, Path, description = "Public campaign identifier")),
    request_body = IdentifyRequest,
    responses(
        (status = 200, description = "Access granted, session issued", body = IdentifyResponse),
        (status = 400, description = "Customer number in no accepted format", body = ErrorResponse),
        (status = 403, description = "Access denied, `details.reason` says why", body = ErrorResponse),
        (status = 404, description = "Unknown campaign", body = ErrorResponse),
        (status = 503, description = "Customer directory unavailable", body = ErrorResponse)
    ),
    tag = "portal"
)]
pub async fn identify_handler(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(request): Json<IdentifyRequest>,
) -> Result<Json<IdentifyResponse>, Localized<AccessError>> {
    let lang = request.lang.unwrap_or_default();
    let response = identify(&state, uuid, request, Actor::Customer)
        .await
        .map_err(|e| e.localized(lang))?;
    Ok(Json(response))
}

/// Handler for POST /c/{uuid}/prospect
/// Registers a company without customer number, then identifies it
#[utoipa::path(
    post,
    path = "/c/{uuid}/prospect",
    params(("uuid" = Uuid, Path, description = "Public campaign identifier")),
    request_body = ProspectRegistration,
    responses(
        (status = 201, description = "Prospect registered, session issued", body = IdentifyResponse),
        (status = 400, description = "Invalid registration form", body = ErrorResponse),
        (status = 403, description = "Campaign closed to prospects or access denied", body = ErrorResponse),
        (status = 404, description = "Unknown campaign", body = ErrorResponse)
    ),
    tag = "portal"
)]
pub async fn register_prospect_handler(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(form): Json<ProspectRegistration>,
) -> Result<(StatusCode, Json<IdentifyResponse>), Localized<AccessError>> {
    let lang = form.lang.unwrap_or_default();
    let response = register_prospect(&state, uuid, form)
        .await
        .map_err(|e| e.localized(lang))?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn register_prospect(
    state: &AppState,
    uuid: Uuid,
    form: ProspectRegistration,
) -> Result<IdentifyResponse, AccessError> {
    let campaign = load_campaign(state, uuid).await?;
    if !campaign.allow_prospects {
        return Err(AccessError::Denied(DenyReason::ProspectsNotAllowed));
    }

    form.validate()?;

    // Nothing is stored for a registration the gate would refuse anyway
    let password = form.password.clone().map(PasswordCredential::Plain);
    check_open_and_country(&campaign, form.country, today()).map_err(AccessError::Denied)?;
    check_password(&campaign, password.as_ref()).map_err(AccessError::Denied)?;
    if campaign.customer_assignment_mode == AssignmentMode::Manual {
        return Err(AccessError::Denied(DenyReason::NotInList));
    }

    let identity = state.customers.register_prospect(&form).await?;

    let access = AccessRequest {
        customer_number: identity.customer_number.clone(),
        country: identity.country,
        password: password.clone(),
        language: form.lang,
        actor: Actor::Customer,
    };
    let grant = resolve(state, &campaign, &access).await?;
    grant_session(state, &campaign, grant, password.as_ref()).await
}

/// Handler for GET /c/{uuid}/rep
/// Representative SSO entry
#[utoipa::path(
    get,
    path = "/c/{uuid}/rep",
    params(
        ("uuid" = Uuid, Path, description = "Public campaign identifier"),
        ("lang" = Option<String>, Query, description = "fr or nl")
    ),
    responses(
        (status = 200, description = "Campaign summary for representatives", body = RepresentativeLanding),
        (status = 401, description = "Missing or invalid representative token", body = ErrorResponse),
        (status = 404, description = "Unknown campaign", body = ErrorResponse)
    ),
    tag = "portal"
)]
pub async fn representative_landing_handler(
    State(state): State<AppState>,
    rep: RepresentativeUser,
    Path(uuid): Path<Uuid>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<RepresentativeLanding>, Localized<AccessError>> {
    let lang = query.language();
    let campaign = load_campaign(&state, uuid).await.map_err(|e| e.localized(lang))?;

    tracing::debug!("Representative {} opened campaign {}", rep.rep_id, uuid);
    Ok(Json(RepresentativeLanding {
        campaign: PublicCampaign::from_campaign(&campaign, lang, today()),
        show_prices: campaign.show_prices,
        representative_name: rep.name,
    }))
}

/// Handler for POST /c/{uuid}/rep/identify
/// The representative picks the customer to order for; same rules as a customer
#[utoipa::path(
    post,
    path = "/c/{uuid}/rep/identify",
    params(("uuid" = Uuid, Path, description = "Public campaign identifier")),
    request_body = IdentifyRequest,
    responses(
        (status = 200, description = "Access granted, representative session issued", body = IdentifyResponse),
        (status = 401, description = "Missing or invalid representative token", body = ErrorResponse),
        (status = 403, description = "Access denied for this customer", body = ErrorResponse),
        (status = 503, description = "Customer directory unavailable", body = ErrorResponse)
    ),
    tag = "portal"
)]
pub async fn representative_identify_handler(
    State(state): State<AppState>,
    rep: RepresentativeUser,
    Path(uuid): Path<Uuid>,
    Json(request): Json<IdentifyRequest>,
) -> Result<Json<IdentifyResponse>, Localized<AccessError>> {
    let lang: Language = request.lang.unwrap_or_default();
    let actor = Actor::Representative {
        id: rep.rep_id,
        name: rep.name,
    };
    let response = identify(&state, uuid, request, actor)
        .await
        .map_err(|e| e.localized(lang))?;
    Ok(Json(response))
}
