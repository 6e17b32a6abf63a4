// HTTP handlers for campaign administration

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::auth::AdminUser;
use crate::campaigns::{
    today, Campaign, CampaignDetail, CampaignError, CampaignForm, CampaignListQuery, CreateCampaignRequest,
    ToggleActiveRequest,
};
use crate::error::ApiError;
use crate::orders::QuotaReport;
use crate::AppState;

async fn detail(state: &AppState, campaign: Campaign) -> Result<CampaignDetail, CampaignError> {
    let status = campaign.status_on(today());
    let collaborator_ids = state.campaigns.collaborator_ids(campaign.id).await?;
    Ok(CampaignDetail {
        campaign,
        status,
        bucket: status.bucket(),
        collaborator_ids,
    })
}

/// Handler for POST /admin/campaigns
/// The calling admin becomes the owner
pub async fn create_campaign_handler(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignDetail>), CampaignError> {
    request.validate()?;

    let campaign = state
        .campaigns
        .create(&request.campaign, admin.admin_id, &request.collaborator_ids)
        .await?;

    tracing::info!(
        "Campaign {} ({}) created by admin {}",
        campaign.id,
        campaign.uuid,
        admin.admin_id
    );
    Ok((StatusCode::CREATED, Json(detail(&state, campaign).await?)))
}

/// Handler for GET /admin/campaigns
/// Optional `?bucket=active|upcoming|archived`
pub async fn list_campaigns_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<CampaignListQuery>,
) -> Result<Json<Vec<CampaignDetail>>, CampaignError> {
    let today = today();
    let campaigns = state.campaigns.list().await?;
    let ids: Vec<i32> = campaigns.iter().map(|c| c.id).collect();
    let mut collaborators = state.campaigns.collaborators_by_campaign(&ids).await?;

    let details: Vec<CampaignDetail> = campaigns
        .into_iter()
        .filter_map(|campaign| {
            let status = campaign.status_on(today);
            let bucket = status.bucket();
            match query.bucket {
                Some(wanted) if wanted != bucket => None,
                _ => Some(CampaignDetail {
                    collaborator_ids: collaborators.remove(&campaign.id).unwrap_or_default(),
                    campaign,
                    status,
                    bucket,
                }),
            }
        })
        .collect();

    tracing::debug!("Listed {} campaigns (bucket {:?})", details.len(), query.bucket);
    Ok(Json(details))
}

/// Handler for GET /admin/campaigns/{id}
pub async fn get_campaign_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<CampaignDetail>, CampaignError> {
    let campaign = state
        .campaigns
        .find_by_id(id)
        .await?
        .ok_or(CampaignError::NotFound(id))?;

    Ok(Json(detail(&state, campaign).await?))
}

/// Handler for PUT /admin/campaigns/{id}
/// Replaces every editable field; existing orders are left untouched
pub async fn update_campaign_handler(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i32>,
    Json(form): Json<CampaignForm>,
) -> Result<Json<CampaignDetail>, CampaignError> {
    form.validate()?;

    let campaign = state
        .campaigns
        .update(id, &form)
        .await?
        .ok_or(CampaignError::NotFound(id))?;

    tracing::info!("Campaign {} updated by admin {}", id, admin.admin_id);
    Ok(Json(detail(&state, campaign).await?))
}

/// Handler for PATCH /admin/campaigns/{id}/active
pub async fn toggle_campaign_handler(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<ToggleActiveRequest>,
) -> Result<Json<CampaignDetail>, CampaignError> {
    let campaign = state
        .campaigns
        .set_active(id, request.is_active)
        .await?
        .ok_or(CampaignError::NotFound(id))?;

    tracing::info!(
        "Campaign {} {} by admin {}",
        id,
        if request.is_active { "activated" } else { "deactivated" },
        admin.admin_id
    );
    Ok(Json(detail(&state, campaign).await?))
}

/// Handler for GET /admin/campaigns/{id}/quota
pub async fn quota_report_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<QuotaReport>, ApiError> {
    let campaign = state
        .campaigns
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign", id))?;

    let report = state.order_service.quota_report(&campaign).await?;
    Ok(Json(report))
}
