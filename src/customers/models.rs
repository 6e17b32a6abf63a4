use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::customers::CustomerNumber;
use crate::i18n::Language;
use crate::models::Country;

/// Canonical identity of a customer as resolved by the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerIdentity {
    pub customer_number: CustomerNumber,
    pub country: Country,
    pub name: String,
    pub representative_id: Option<String>,
    pub representative_name: Option<String>,
    pub cluster: Option<String>,
    pub language: Option<Language>,
    pub is_prospect: bool,
}

/// Row shape shared by the two external directory tables
#[derive(Debug, Clone, FromRow)]
pub struct DirectoryRow {
    pub customer_number: String,
    pub name: String,
    pub representative_id: Option<String>,
    pub representative_name: Option<String>,
    pub cluster: Option<String>,
    pub language: Option<String>,
}

impl DirectoryRow {
    /// Convert a registry row, skipping rows whose number is in no accepted format
    pub fn into_identity(self, country: Country) -> Option<CustomerIdentity> {
        let customer_number = match CustomerNumber::parse(&self.customer_number) {
            Ok(number) => number,
            Err(e) => {
                tracing::warn!("Skipping directory row for {}: {}", country, e);
                return None;
            }
        };

        Some(CustomerIdentity {
            is_prospect: customer_number.is_prospect(),
            customer_number,
            country,
            name: self.name,
            representative_id: self.representative_id,
            representative_name: self.representative_name,
            cluster: self.cluster,
            language: self.language.as_deref().and_then(Language::parse),
        })
    }
}

/// Query for the cluster dropdown
#[derive(Debug, Deserialize)]
pub struct ClusterQuery {
    pub country: Country,
}

/// Query for the representative dropdown, optionally narrowed to one cluster
#[derive(Debug, Deserialize)]
pub struct RepresentativeQuery {
    pub country: Country,
    pub cluster: Option<String>,
}

/// Entry of the representative dropdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RepresentativeOption {
    pub representative_id: String,
    pub representative_name: Option<String>,
}

/// Query of the admin import endpoint
#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub country: Country,
}

/// Outcome of an admin import from the directory
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportSummary {
    pub country: Country,
    pub fetched: usize,
    pub upserted: usize,
}

/// Registration form for customers without a customer number
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProspectRegistration {
    #[validate(length(min = 2, max = 200, message = "Company name is required"))]
    pub company_name: String,
    #[validate(email(message = "A valid e-mail address is required"))]
    pub email: String,
    pub country: Country,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(length(max = 40))]
    pub vat_number: Option<String>,
    pub password: Option<String>,
    pub lang: Option<Language>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(number: &str, language: Option<&str>) -> DirectoryRow {
        DirectoryRow {
            customer_number: number.to_string(),
            name: "Pharmacie Centrale".to_string(),
            representative_id: Some("R12".to_string()),
            representative_name: Some("Jan Peeters".to_string()),
            cluster: Some("Brussels".to_string()),
            language: language.map(str::to_string),
        }
    }

    #[test]
    fn test_directory_row_conversion() {
        let identity = row(" 123456 ", Some("NL")).into_identity(Country::Be).unwrap();
        assert_eq!(identity.customer_number.as_str(), "123456");
        assert_eq!(identity.country, Country::Be);
        assert_eq!(identity.language, Some(Language::Nl));
        assert!(!identity.is_prospect);
    }

    #[test]
    fn test_directory_row_with_invalid_number_is_skipped() {
        assert!(row("ABC", None).into_identity(Country::Lu).is_none());
    }

    #[test]
    fn test_prospect_registration_validation() {
        let valid = ProspectRegistration {
            company_name: "Nouvelle Pharmacie".to_string(),
            email: "contact@example.be".to_string(),
            country: Country::Be,
            phone: None,
            vat_number: Some("BE0123456789".to_string()),
            password: None,
            lang: None,
        };
        assert!(valid.validate().is_ok());

        let invalid = ProspectRegistration {
            email: "not-an-email".to_string(),
            ..valid
        };
        assert!(invalid.validate().is_err());
    }
}
