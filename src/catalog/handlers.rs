// HTTP handlers for catalog administration and the portal catalog

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::access::{AccessDecision, AccessError, AccessRequest, Actor};
use crate::auth::{AdminUser, PortalSession};
use crate::campaigns::{today, Campaign, PublicCampaign, ToggleActiveRequest};
use crate::catalog::{build_catalog, CatalogView, Category, CreateCategoryRequest, CreateProductRequest, Product};
use crate::error::ApiError;
use crate::i18n::{Localize, Localized};
use crate::AppState;

async fn admin_campaign(state: &AppState, id: i32) -> Result<Campaign, ApiError> {
    state
        .campaigns
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign", id))
}

/// Handler for POST /admin/campaigns/{id}/categories
pub async fn create_category_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    request.validate()?;
    let campaign = admin_campaign(&state, id).await?;

    let category = state.catalog.create_category(campaign.id, &request).await?;
    tracing::info!("Category {} created in campaign {}", category.id, campaign.id);
    Ok((StatusCode::CREATED, Json(category)))
}

/// Handler for POST /admin/campaigns/{id}/products
/// Product codes are unique within a campaign (409 otherwise)
pub async fn create_product_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    request.validate()?;
    let campaign = admin_campaign(&state, id).await?;

    if let Some(category_id) = request.category_id {
        if !state.catalog.category_belongs_to(category_id, campaign.id).await? {
            let mut errors = ValidationErrors::new();
            let mut error = ValidationError::new("category_not_in_campaign");
            error.message = Some(format!("Category {} does not belong to campaign {}", category_id, campaign.id).into());
            errors.add("category_id", error);
            return Err(ApiError::ValidationError(errors));
        }
    }

    let product = state.catalog.create_product(campaign.id, &request).await?;
    tracing::info!("Product {} ({}) created in campaign {}", product.id, product.code, campaign.id);
    Ok((StatusCode::CREATED, Json(product)))
}

/// Handler for PATCH /admin/products/{id}/active
pub async fn toggle_product_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<ToggleActiveRequest>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .catalog
        .set_product_active(id, request.is_active)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    tracing::info!("Product {} is_active set to {}", id, product.is_active);
    Ok(Json(product))
}

/// Handler for GET /c/{uuid}/catalog
/// Access is re-checked on every load; prices only reach representative sessions
#[utoipa::path(
    get,
    path = "/c/{uuid}/catalog",
    params(("uuid" = Uuid, Path, description = "Public campaign identifier")),
    responses(
        (status = 200, description = "Catalog in the session language", body = CatalogView),
        (status = 401, description = "Missing or expired session", body = ErrorResponse),
        (status = 403, description = "Access no longer granted", body = ErrorResponse),
        (status = 503, description = "Customer directory unavailable", body = ErrorResponse)
    ),
    tag = "portal"
)]
pub async fn catalog_handler(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    PortalSession(claims): PortalSession,
) -> Result<Json<CatalogView>, Localized<AccessError>> {
    let lang = claims.lang;
    let view = load_catalog(&state, uuid, &claims).await.map_err(|e| e.localized(lang))?;
    Ok(Json(view))
}

async fn load_catalog(
    state: &AppState,
    uuid: Uuid,
    claims: &crate::auth::SessionClaims,
) -> Result<CatalogView, AccessError> {
    let today = today();
    let campaign = state
        .campaigns
        .find_by_uuid(uuid)
        .await?
        .ok_or(AccessError::CampaignNotFound)?;

    let request = AccessRequest::from_session(claims)?;
    let grant = match state.access.resolve(&campaign, &request, today).await? {
        AccessDecision::Allow(grant) => grant,
        AccessDecision::Deny(reason) => return Err(AccessError::Denied(reason)),
    };

    let show_prices = campaign.show_prices && matches!(grant.actor, Actor::Representative { .. });
    let categories = state.catalog.list_categories(campaign.id).await?;
    let products = state.catalog.list_active_products(campaign.id).await?;

    Ok(CatalogView {
        campaign: PublicCampaign::from_campaign(&campaign, grant.language, today),
        actor: grant.actor.kind(),
        language: grant.language,
        show_prices,
        categories: build_catalog(&categories, &products, grant.language, show_prices),
    })
}
