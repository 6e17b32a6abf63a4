use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Effective status of a campaign, derived on every read and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Switched off and not started yet
    Draft,
    /// Switched on, starts later
    Scheduled,
    /// Switched on and today within [start_date, end_date]
    Active,
    /// Past its end date, whatever the toggle says
    Ended,
    /// Switched off after its start date
    Disabled,
}

/// Admin list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListBucket {
    Active,
    Upcoming,
    Archived,
}

impl CampaignStatus {
    /// Classify a campaign from its stored toggle and dates
    ///
    /// Precedence: ended > draft > disabled; an enabled campaign is scheduled
    /// before its start date and active until its end date (both inclusive).
    pub fn derive(is_active: bool, start_date: NaiveDate, end_date: NaiveDate, today: NaiveDate) -> Self {
        if today > end_date {
            CampaignStatus::Ended
        } else if !is_active {
            if today < start_date {
                CampaignStatus::Draft
            } else {
                CampaignStatus::Disabled
            }
        } else if today < start_date {
            CampaignStatus::Scheduled
        } else {
            CampaignStatus::Active
        }
    }

    /// Only active campaigns accept identification and orders
    pub fn is_open(&self) -> bool {
        matches!(self, CampaignStatus::Active)
    }

    pub fn bucket(&self) -> ListBucket {
        match self {
            CampaignStatus::Active => ListBucket::Active,
            CampaignStatus::Scheduled => ListBucket::Upcoming,
            CampaignStatus::Draft | CampaignStatus::Ended | CampaignStatus::Disabled => ListBucket::Archived,
        }
    }
}

/// Calendar day used for campaign gating (server local time)
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
