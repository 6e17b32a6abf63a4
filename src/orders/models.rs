use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::campaigns::ProcessingMode;
use crate::customers::CustomerIdentity;
use crate::i18n::Language;
use crate::models::Country;

/// Export state of an order, fixed at creation from the campaign processing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Direct processing: handed to the export collaborator on admission
    ExportQueued,
    /// Pending processing: waits for a manual batch export
    AwaitingExport,
}

impl OrderStatus {
    pub fn for_mode(mode: ProcessingMode) -> Self {
        match mode {
            ProcessingMode::Direct => OrderStatus::ExportQueued,
            ProcessingMode::Pending => OrderStatus::AwaitingExport,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::ExportQueued => "export_queued",
            OrderStatus::AwaitingExport => "awaiting_export",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admitted order; rows are write-once
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i32,
    pub uuid: Uuid,
    pub campaign_id: i32,
    pub customer_number: String,
    pub customer_country: Country,
    pub customer_name: String,
    pub customer_email: String,
    pub representative_id: Option<String>,
    pub representative_name: Option<String>,
    pub language: Language,
    pub total_items: i32,
    pub status: OrderStatus,
    pub submission_nonce: Option<Uuid>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn belongs_to(&self, customer_number: &str, country: Country) -> bool {
        self.customer_number == customer_number && self.customer_country == country
    }
}

/// Order line with the product code and name as they were at admission
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
}

/// Line to insert with a new order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: i32,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
}

/// Order header to insert; `total_items` is derived from the lines
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub campaign_id: i32,
    pub customer: CustomerIdentity,
    pub customer_email: String,
    pub representative_id: Option<String>,
    pub representative_name: Option<String>,
    pub language: Language,
    pub status: OrderStatus,
    pub submission_nonce: Option<Uuid>,
    pub comment: Option<String>,
}

/// One cart entry as sent by the portal
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    #[schema(example = "P-100")]
    pub product_code: String,
    pub quantity: i64,
}

/// Body of POST /c/{uuid}/checkout
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

/// Body of POST /c/{uuid}/order/submit
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitOrderRequest {
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[validate(email(message = "A valid e-mail address is required"))]
    pub customer_email: String,
    #[serde(default)]
    pub terms_accepted: bool,
    /// The customer acknowledged the order is final
    #[serde(default)]
    pub final_order_acknowledged: bool,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
    /// Client-generated key; resubmitting the same key returns the first order
    pub submission_nonce: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLineResponse {
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            product_code: line.product_code,
            product_name: line.product_name,
            quantity: line.quantity,
        }
    }
}

/// Order as returned to the portal and to admins
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub uuid: Uuid,
    pub status: OrderStatus,
    pub customer_number: String,
    pub customer_country: Country,
    pub customer_name: String,
    pub customer_email: String,
    pub representative_name: Option<String>,
    pub language: Language,
    pub total_items: i32,
    pub comment: Option<String>,
    pub lines: Vec<OrderLineResponse>,
    pub created_at: DateTime<Utc>,
}

impl OrderResponse {
    pub fn new(order: Order, lines: Vec<OrderLine>) -> Self {
        Self {
            uuid: order.uuid,
            status: order.status,
            customer_number: order.customer_number,
            customer_country: order.customer_country,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            representative_name: order.representative_name,
            language: order.language,
            total_items: order.total_items,
            comment: order.comment,
            lines: lines.into_iter().map(OrderLineResponse::from).collect(),
            created_at: order.created_at,
        }
    }
}

/// Result of a checkout dry run: what a submission would admit right now
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutPreview {
    pub campaign_uuid: Uuid,
    pub customer: CustomerIdentity,
    pub lines: Vec<OrderLineResponse>,
    pub total_items: i64,
    pub status: OrderStatus,
    pub delivery_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomerConsumption {
    pub customer_number: String,
    pub customer_country: Country,
    pub consumed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductConsumption {
    pub product_id: i32,
    pub product_code: String,
    pub max_total: Option<i32>,
    pub max_per_customer: Option<i32>,
    pub consumed: i64,
}

/// Admin view of consumption against the caps of a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaReport {
    pub campaign_id: i32,
    pub global_quota: Option<i32>,
    pub quota_per_customer: Option<i32>,
    pub consumed_total: i64,
    pub customers: Vec<CustomerConsumption>,
    pub products: Vec<ProductConsumption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_processing_mode() {
        assert_eq!(OrderStatus::for_mode(ProcessingMode::Direct), OrderStatus::ExportQueued);
        assert_eq!(OrderStatus::for_mode(ProcessingMode::Pending), OrderStatus::AwaitingExport);
        assert_eq!(
            serde_json::to_string(&OrderStatus::AwaitingExport).unwrap(),
            "\"awaiting_export\""
        );
    }

    #[test]
    fn test_submit_request_defaults_and_email() {
        let request: SubmitOrderRequest = serde_json::from_value(serde_json::json!({
            "customer_email": "not-an-email"
        }))
        .unwrap();
        assert!(request.lines.is_empty());
        assert!(!request.terms_accepted);
        assert!(request.submission_nonce.is_none());
        assert!(request.validate().is_err());

        let request = SubmitOrderRequest {
            customer_email: "achats@pharmacie.be".to_string(),
            ..request
        };
        assert!(request.validate().is_ok());
    }
}
