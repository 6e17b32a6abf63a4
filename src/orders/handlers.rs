// HTTP handlers for checkout, submission and order reads

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::{AdminUser, PortalSession};
use crate::campaigns::today;
use crate::error::ApiError;
use crate::i18n::{Localize, Localized};
use crate::orders::{
    CheckoutPreview, CheckoutRequest, OrderError, OrderListQuery, OrderResponse, Submission, SubmitOrderRequest,
};
use crate::AppState;

/// Handler for POST /c/{uuid}/checkout
/// Validates a cart against the campaign as it is now, without writing anything
#[utoipa::path(
    post,
    path = "/c/{uuid}/checkout",
    params(("uuid" = Uuid, Path, description = "Public campaign identifier")),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Cart would be admitted", body = CheckoutPreview),
        (status = 400, description = "Empty cart, unknown product or invalid quantity", body = ErrorResponse),
        (status = 403, description = "Access no longer granted", body = ErrorResponse),
        (status = 409, description = "Quota exceeded", body = ErrorResponse),
        (status = 503, description = "Customer directory unavailable", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn checkout_handler(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    PortalSession(claims): PortalSession,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutPreview>, Localized<OrderError>> {
    let preview = state
        .order_service
        .preview(uuid, &claims, &request, today())
        .await
        .map_err(|e| e.localized(claims.lang))?;

    Ok(Json(preview))
}

/// Handler for POST /c/{uuid}/order/submit
/// Admits the order; a repeated submission key returns the first order with 200
#[utoipa::path(
    post,
    path = "/c/{uuid}/order/submit",
    params(("uuid" = Uuid, Path, description = "Public campaign identifier")),
    request_body = SubmitOrderRequest,
    responses(
        (status = 201, description = "Order admitted", body = OrderResponse),
        (status = 200, description = "Same submission key seen before, original order returned", body = OrderResponse),
        (status = 400, description = "Invalid cart or form", body = ErrorResponse),
        (status = 403, description = "Access no longer granted", body = ErrorResponse),
        (status = 409, description = "Quota exceeded or submission key conflict", body = ErrorResponse),
        (status = 503, description = "Customer directory unavailable", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn submit_order_handler(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    PortalSession(claims): PortalSession,
    Json(request): Json<SubmitOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), Localized<OrderError>> {
    let submission = state
        .order_service
        .submit(uuid, &claims, request, today())
        .await
        .map_err(|e| e.localized(claims.lang))?;

    Ok(match submission {
        Submission::Created(order) => (StatusCode::CREATED, Json(order)),
        Submission::Duplicate(order) => (StatusCode::OK, Json(order)),
    })
}

/// Handler for GET /c/{uuid}/order/{order_uuid}
/// Only the customer the order was placed for can read it
#[utoipa::path(
    get,
    path = "/c/{uuid}/order/{order_uuid}",
    params(
        ("uuid" = Uuid, Path, description = "Public campaign identifier"),
        ("order_uuid" = Uuid, Path, description = "Order reference")
    ),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "No such order for this session", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path((uuid, order_uuid)): Path<(Uuid, Uuid)>,
    PortalSession(claims): PortalSession,
) -> Result<Json<OrderResponse>, Localized<OrderError>> {
    let order = state
        .order_service
        .get_order(uuid, &claims, order_uuid)
        .await
        .map_err(|e| e.localized(claims.lang))?;

    Ok(Json(order))
}

/// Handler for GET /admin/campaigns/{id}/orders
pub async fn list_campaign_orders_handler(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i32>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    if state.campaigns.find_by_id(id).await?.is_none() {
        return Err(ApiError::not_found("Campaign", id));
    }

    let orders = state.order_service.list_orders(id, query.status).await?;
    tracing::debug!("Admin {} listed {} orders of campaign {}", admin.admin_id, orders.len(), id);
    Ok(Json(orders))
}
