use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::campaigns::{CampaignStatus, ListBucket};
use crate::i18n::Language;
use crate::models::Country;
use crate::validation::validate_campaign_form;

/// Rule deciding which customers may open a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    /// Any active customer of the campaign country
    Automatic,
    /// Only customers listed in `customer_list`
    Manual,
    /// Any customer knowing the shared `order_password`
    Protected,
}

impl AssignmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentMode::Automatic => "automatic",
            AssignmentMode::Manual => "manual",
            AssignmentMode::Protected => "protected",
        }
    }
}

impl std::fmt::Display for AssignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// W = normal order from stock, V = prospection / pre-order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum CampaignType {
    #[serde(rename = "W")]
    #[sqlx(rename = "W")]
    Normal,
    #[serde(rename = "V")]
    #[sqlx(rename = "V")]
    Prospection,
}

/// How admitted orders reach the downstream export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Export is triggered as soon as the order is committed
    Direct,
    /// Orders wait for a manual batch export
    Pending,
}

/// Campaign row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Campaign {
    pub id: i32,
    pub uuid: Uuid,
    pub name: String,
    pub title_fr: String,
    pub title_nl: String,
    pub description_fr: Option<String>,
    pub description_nl: Option<String>,
    pub country: Country,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub customer_assignment_mode: AssignmentMode,
    pub customer_list: Option<String>,
    pub order_password: Option<String>,
    pub campaign_type: CampaignType,
    pub order_processing_mode: ProcessingMode,
    pub deferred_delivery: bool,
    pub delivery_date: Option<NaiveDate>,
    pub allow_prospects: bool,
    pub show_prices: bool,
    pub global_quota: Option<i32>,
    pub quota_per_customer: Option<i32>,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Effective lifecycle status on a given day
    pub fn status_on(&self, today: NaiveDate) -> CampaignStatus {
        CampaignStatus::derive(self.is_active, self.start_date, self.end_date, today)
    }

    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.status_on(today).is_open()
    }

    pub fn title(&self, lang: Language) -> &str {
        lang.pick(&self.title_fr, &self.title_nl)
    }

    pub fn description(&self, lang: Language) -> Option<&str> {
        match lang {
            Language::Fr => self.description_fr.as_deref(),
            Language::Nl => self.description_nl.as_deref(),
        }
    }
}

/// Editable campaign fields, used as-is by PUT and embedded in the create request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_campaign_form", skip_on_field_errors = false))]
pub struct CampaignForm {
    #[validate(length(min = 1, max = 200, message = "Internal name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "French title is required"))]
    pub title_fr: String,

    #[validate(length(min = 1, max = 200, message = "Dutch title is required"))]
    pub title_nl: String,

    pub description_fr: Option<String>,
    pub description_nl: Option<String>,
    pub country: Country,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(default = "default_true")]
    pub is_active: bool,

    pub customer_assignment_mode: AssignmentMode,
    pub customer_list: Option<String>,
    pub order_password: Option<String>,
    pub campaign_type: CampaignType,
    pub order_processing_mode: ProcessingMode,

    #[serde(default)]
    pub deferred_delivery: bool,
    pub delivery_date: Option<NaiveDate>,

    #[serde(default)]
    pub allow_prospects: bool,
    #[serde(default)]
    pub show_prices: bool,

    #[validate(range(min = 1, message = "Global quota must be at least 1"))]
    pub global_quota: Option<i32>,

    #[validate(range(min = 1, message = "Quota per customer must be at least 1"))]
    pub quota_per_customer: Option<i32>,
}

fn default_true() -> bool {
    true
}

/// Body of POST /admin/campaigns
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCampaignRequest {
    #[serde(flatten)]
    #[validate]
    pub campaign: CampaignForm,

    /// Admin ids sharing the campaign with its owner
    #[serde(default)]
    pub collaborator_ids: Vec<i32>,
}

/// Body of PATCH /admin/campaigns/:id/active (also used for products)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ToggleActiveRequest {
    pub is_active: bool,
}

/// Query of the admin campaign list
#[derive(Debug, Default, Deserialize)]
pub struct CampaignListQuery {
    pub bucket: Option<ListBucket>,
}

/// Admin view of a campaign with its derived status
#[derive(Debug, Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub status: CampaignStatus,
    pub bucket: ListBucket,
    pub collaborator_ids: Vec<i32>,
}

/// Customer-facing campaign landing data
///
/// Never carries the internal name, the customer list or the password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicCampaign {
    pub uuid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub country: Country,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CampaignStatus,
    pub campaign_type: CampaignType,
    pub customer_assignment_mode: AssignmentMode,
    pub requires_password: bool,
    pub allow_prospects: bool,
    pub deferred_delivery: bool,
    pub delivery_date: Option<NaiveDate>,
    pub language: Language,
}

impl PublicCampaign {
    pub fn from_campaign(campaign: &Campaign, lang: Language, today: NaiveDate) -> Self {
        Self {
            uuid: campaign.uuid,
            title: campaign.title(lang).to_string(),
            description: campaign.description(lang).map(str::to_string),
            country: campaign.country,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            status: campaign.status_on(today),
            campaign_type: campaign.campaign_type,
            customer_assignment_mode: campaign.customer_assignment_mode,
            requires_password: campaign.customer_assignment_mode == AssignmentMode::Protected,
            allow_prospects: campaign.allow_prospects,
            deferred_delivery: campaign.deferred_delivery,
            delivery_date: campaign.delivery_date,
            language: lang,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_wire_spelling() {
        assert_eq!(serde_json::to_string(&CampaignType::Normal).unwrap(), "\"W\"");
        assert_eq!(serde_json::to_string(&CampaignType::Prospection).unwrap(), "\"V\"");
        assert_eq!(serde_json::to_string(&AssignmentMode::Protected).unwrap(), "\"protected\"");
        assert_eq!(serde_json::to_string(&ProcessingMode::Pending).unwrap(), "\"pending\"");
    }

    #[test]
    fn test_public_campaign_hides_admin_fields() {
        let today = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
        let mut campaign = fixtures::campaign(today);
        campaign.customer_assignment_mode = AssignmentMode::Protected;
        campaign.order_password = Some("Secret!".to_string());

        let public = PublicCampaign::from_campaign(&campaign, Language::Nl, today);
        assert_eq!(public.title, "Lentepromo");
        assert!(public.description.is_none());
        assert!(public.requires_password);
        assert_eq!(public.status, CampaignStatus::Active);

        let body = serde_json::to_value(&public).unwrap();
        assert!(body.get("order_password").is_none());
        assert!(body.get("customer_list").is_none());
        assert!(body.get("name").is_none());
    }

    #[test]
    fn test_create_request_flattens_form() {
        let body = json!({
            "name": "Promo",
            "title_fr": "Promo",
            "title_nl": "Promo",
            "country": "LU",
            "start_date": "2026-05-01",
            "end_date": "2026-05-31",
            "customer_assignment_mode": "automatic",
            "campaign_type": "W",
            "order_processing_mode": "direct",
            "collaborator_ids": [4, 7]
        });

        let request: CreateCampaignRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.campaign.country, Country::Lu);
        assert!(request.campaign.is_active);
        assert!(!request.campaign.allow_prospects);
        assert_eq!(request.collaborator_ids, vec![4, 7]);
        assert!(request.validate().is_ok());
    }
}
