// Order admission pipeline
//
// Fail-fast order: access re-check, duplicate submission, empty cart, form,
// product validity, quantities and product bounds, campaign quotas, insert.
// Everything from the duplicate check on runs in one transaction that starts
// by locking the campaign row, so admissions on a campaign are serialized.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::access::{evaluate_gate, AccessDecision, AccessGrant, AccessRequest, AccessResolver, Actor, DenyReason};
use crate::auth::SessionClaims;
use crate::campaigns::{Campaign, CampaignRepository, ProcessingMode};
use crate::catalog::{CatalogRepository, Product};
use crate::i18n::Language;
use crate::orders::{
    CartLine, CheckoutPreview, CheckoutRequest, ExportDispatcher, NewOrder, NewOrderLine, OrderError,
    OrderLineResponse, OrderRepository, OrderResponse, OrderStatus, ProductUsage, QuotaLedger, QuotaLimits,
    QuotaReport, SubmitOrderRequest,
};

/// Cart entry after merging lines that name the same product code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    pub product_code: String,
    pub quantity: i64,
    /// Some merged line had a zero or negative quantity
    pub has_non_positive: bool,
}

/// Submitted cart, merged by product code in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn from_lines(lines: &[CartLine]) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let mut entries: Vec<CartEntry> = Vec::new();
        for line in lines {
            let code = line.product_code.trim();
            match entries.iter_mut().find(|e| e.product_code == code) {
                Some(entry) => {
                    entry.quantity = entry.quantity.saturating_add(line.quantity);
                    entry.has_non_positive |= line.quantity <= 0;
                }
                None => entries.push(CartEntry {
                    product_code: code.to_string(),
                    quantity: line.quantity,
                    has_non_positive: line.quantity <= 0,
                }),
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn codes(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.product_code.clone()).collect()
    }

    pub fn total(&self) -> i64 {
        self.entries.iter().fold(0i64, |acc, e| acc.saturating_add(e.quantity))
    }
}

/// Match cart entries to products and enforce quantities and product bounds
///
/// Every code is checked for validity before any quantity is looked at.
pub fn prepare_lines(
    cart: &Cart,
    products: &[Product],
    usage: &HashMap<i32, ProductUsage>,
    lang: Language,
) -> Result<Vec<NewOrderLine>, OrderError> {
    let matched: Vec<(&CartEntry, &Product)> = cart
        .entries()
        .iter()
        .map(|entry| {
            products
                .iter()
                .find(|p| p.code == entry.product_code && p.is_active)
                .map(|product| (entry, product))
                .ok_or_else(|| OrderError::InvalidProduct(entry.product_code.clone()))
        })
        .collect::<Result<_, _>>()?;

    let mut lines = Vec::with_capacity(matched.len());
    let mut total: i64 = 0;

    for (entry, product) in matched {
        let invalid = || OrderError::QuantityInvalid(entry.product_code.clone());

        if entry.has_non_positive {
            return Err(invalid());
        }
        let quantity = i32::try_from(entry.quantity).map_err(|_| invalid())?;

        let used = usage.get(&product.id).copied().unwrap_or_default();
        if let Some(max) = product.max_per_customer {
            if used.customer + entry.quantity > i64::from(max) {
                return Err(invalid());
            }
        }
        if let Some(max) = product.max_total {
            if used.total + entry.quantity > i64::from(max) {
                return Err(invalid());
            }
        }

        total += entry.quantity;
        if total > i64::from(i32::MAX) {
            return Err(invalid());
        }

        lines.push(NewOrderLine {
            product_id: product.id,
            product_code: product.code.clone(),
            product_name: product.name(lang).to_string(),
            quantity,
        });
    }

    Ok(lines)
}

/// Outcome of a submission
#[derive(Debug)]
pub enum Submission {
    Created(OrderResponse),
    /// The submission key was already used by this customer; nothing was written
    Duplicate(OrderResponse),
}

/// Service for order admission and order reads
#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    campaigns: CampaignRepository,
    catalog: CatalogRepository,
    orders: OrderRepository,
    access: AccessResolver,
    exporter: Arc<dyn ExportDispatcher>,
}

impl OrderService {
    pub fn new(
        pool: PgPool,
        campaigns: CampaignRepository,
        catalog: CatalogRepository,
        orders: OrderRepository,
        access: AccessResolver,
        exporter: Arc<dyn ExportDispatcher>,
    ) -> Self {
        Self {
            pool,
            campaigns,
            catalog,
            orders,
            access,
            exporter,
        }
    }

    /// Re-run the access decision the session was issued for
    async fn authorize(
        &self,
        campaign: &Campaign,
        claims: &SessionClaims,
        today: NaiveDate,
    ) -> Result<AccessGrant, OrderError> {
        let request = AccessRequest::from_session(claims)?;
        match self.access.resolve(campaign, &request, today).await? {
            AccessDecision::Allow(grant) => Ok(grant),
            AccessDecision::Deny(reason) => Err(OrderError::Denied(reason)),
        }
    }

    async fn load_campaign(&self, campaign_uuid: Uuid) -> Result<Campaign, OrderError> {
        self.campaigns
            .find_by_uuid(campaign_uuid)
            .await?
            .ok_or(OrderError::CampaignNotFound)
    }

    /// Products, product bounds and campaign quotas for `cart`, on `conn`
    async fn check_cart(
        &self,
        conn: &mut PgConnection,
        campaign: &Campaign,
        grant: &AccessGrant,
        cart: &Cart,
    ) -> Result<Vec<NewOrderLine>, OrderError> {
        let customer = &grant.customer;

        let products = self
            .catalog
            .find_active_by_codes(&mut *conn, campaign.id, &cart.codes())
            .await?;
        let product_ids: Vec<i32> = products.iter().map(|p| p.id).collect();
        let product_usage = self
            .orders
            .product_usage(&mut *conn, &product_ids, &customer.customer_number, customer.country)
            .await?;

        let lines = prepare_lines(cart, &products, &product_usage, grant.language)?;

        let limits = QuotaLimits::of(campaign);
        if !limits.is_unlimited() {
            let usage =
                QuotaLedger::load_usage(&mut *conn, campaign.id, &customer.customer_number, customer.country).await?;
            QuotaLedger::check(limits, usage, cart.total()).map_err(OrderError::QuotaExceeded)?;
        }

        Ok(lines)
    }

    /// Validate a cart against the current campaign state without writing anything
    pub async fn preview(
        &self,
        campaign_uuid: Uuid,
        claims: &SessionClaims,
        request: &CheckoutRequest,
        today: NaiveDate,
    ) -> Result<CheckoutPreview, OrderError> {
        let campaign = self.load_campaign(campaign_uuid).await?;
        let grant = self.authorize(&campaign, claims, today).await?;
        let cart = Cart::from_lines(&request.lines)?;

        let mut conn = self.pool.acquire().await?;
        let lines = self.check_cart(&mut *conn, &campaign, &grant, &cart).await?;

        Ok(CheckoutPreview {
            campaign_uuid: campaign.uuid,
            customer: grant.customer,
            total_items: cart.total(),
            lines: lines
                .into_iter()
                .map(|l| OrderLineResponse {
                    product_code: l.product_code,
                    product_name: l.product_name,
                    quantity: l.quantity,
                })
                .collect(),
            status: OrderStatus::for_mode(campaign.order_processing_mode),
            delivery_date: campaign.delivery_date,
        })
    }

    /// Admit an order
    ///
    /// A rejection leaves no order and no line behind. Export failures after
    /// commit are logged and do not undo the admission.
    pub async fn submit(
        &self,
        campaign_uuid: Uuid,
        claims: &SessionClaims,
        request: SubmitOrderRequest,
        today: NaiveDate,
    ) -> Result<Submission, OrderError> {
        // Directory round-trip happens before the row lock is taken
        let campaign = self.load_campaign(campaign_uuid).await?;
        let grant = self.authorize(&campaign, claims, today).await?;

        let mut tx = self.pool.begin().await?;

        let campaign = self
            .campaigns
            .lock_by_uuid(&mut *tx, campaign_uuid)
            .await?
            .ok_or(OrderError::CampaignNotFound)?;

        let customer = &grant.customer;
        let password = claims.password();
        evaluate_gate(&campaign, &customer.customer_number, customer.country, password.as_ref(), today)
            .map_err(OrderError::Denied)?;
        if customer.is_prospect && !campaign.allow_prospects {
            return Err(OrderError::Denied(DenyReason::ProspectsNotAllowed));
        }

        if let Some(nonce) = request.submission_nonce {
            if let Some(existing) = self.orders.find_by_nonce(&mut *tx, campaign.id, nonce).await? {
                if !existing.belongs_to(customer.customer_number.as_str(), customer.country) {
                    return Err(OrderError::SubmissionConflict);
                }
                let lines = self.orders.lines(&mut *tx, existing.id).await?;
                tx.rollback().await?;
                info!("Duplicate submission {} returned order {}", nonce, existing.uuid);
                return Ok(Submission::Duplicate(OrderResponse::new(existing, lines)));
            }
        }

        let cart = Cart::from_lines(&request.lines)?;

        request.validate()?;
        if !(request.terms_accepted && request.final_order_acknowledged) {
            return Err(OrderError::TermsNotAccepted);
        }

        let lines = self.check_cart(&mut *tx, &campaign, &grant, &cart).await?;

        let (representative_id, representative_name) = match &grant.actor {
            Actor::Representative { id, name } => (Some(id.clone()), Some(name.clone())),
            Actor::Customer => (customer.representative_id.clone(), customer.representative_name.clone()),
        };

        let new_order = NewOrder {
            campaign_id: campaign.id,
            customer: customer.clone(),
            customer_email: request.customer_email.clone(),
            representative_id,
            representative_name,
            language: grant.language,
            status: OrderStatus::for_mode(campaign.order_processing_mode),
            submission_nonce: request.submission_nonce,
            comment: request.comment.clone().filter(|c| !c.trim().is_empty()),
        };

        let (order, lines) = self.orders.insert(&mut *tx, &new_order, &lines).await?;
        tx.commit().await?;

        info!(
            "Order {} admitted on campaign {} for {} ({} items, {})",
            order.uuid, campaign.uuid, order.customer_number, order.total_items, order.status
        );

        if campaign.order_processing_mode == ProcessingMode::Direct {
            match self.exporter.dispatch(&campaign, &order, &lines).await {
                Ok(()) => info!("Export dispatched for order {}", order.uuid),
                Err(e) => error!("Export dispatch failed for order {}: {}", order.uuid, e),
            }
        }

        Ok(Submission::Created(OrderResponse::new(order, lines)))
    }

    /// Order of the session's customer on this campaign
    pub async fn get_order(
        &self,
        campaign_uuid: Uuid,
        claims: &SessionClaims,
        order_uuid: Uuid,
    ) -> Result<OrderResponse, OrderError> {
        let campaign = self.load_campaign(campaign_uuid).await?;
        let order = self
            .orders
            .find_by_uuid(order_uuid)
            .await?
            .filter(|o| o.campaign_id == campaign.id && o.belongs_to(&claims.customer_number, claims.country))
            .ok_or(OrderError::OrderNotFound)?;

        let mut conn = self.pool.acquire().await?;
        let lines = self.orders.lines(&mut *conn, order.id).await?;
        Ok(OrderResponse::new(order, lines))
    }

    /// Orders of a campaign with their lines, for admins
    pub async fn list_orders(
        &self,
        campaign_id: i32,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderResponse>, sqlx::Error> {
        let orders = self.orders.list_by_campaign(campaign_id, status).await?;
        let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let mut lines = self.orders.lines_for(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let order_lines = lines.remove(&order.id).unwrap_or_default();
                OrderResponse::new(order, order_lines)
            })
            .collect())
    }

    /// Consumption against the caps of a campaign
    pub async fn quota_report(&self, campaign: &Campaign) -> Result<QuotaReport, sqlx::Error> {
        let customers = self.orders.consumption_by_customer(campaign.id).await?;
        let products = self.orders.consumption_by_product(campaign.id).await?;

        Ok(QuotaReport {
            campaign_id: campaign.id,
            global_quota: campaign.global_quota,
            quota_per_customer: campaign.quota_per_customer,
            consumed_total: customers.iter().map(|c| c.consumed).sum(),
            customers,
            products,
        })
    }
}
