use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Country scope of campaigns and customers
///
/// Customers always belong to BE or LU; `Both` only appears on campaigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    Be,
    Lu,
    Both,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Be => "BE",
            Country::Lu => "LU",
            Country::Both => "BOTH",
        }
    }

    /// Whether a customer of `customer_country` falls inside this campaign scope
    pub fn admits(&self, customer_country: Country) -> bool {
        match self {
            Country::Both => customer_country != Country::Both,
            scoped => *scoped == customer_country,
        }
    }

    /// Only BE and LU have a customer directory behind them
    pub fn is_customer_country(&self) -> bool {
        !matches!(self, Country::Both)
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
