use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::access::ActorKind;
use crate::campaigns::PublicCampaign;
use crate::i18n::Language;
use crate::validation::validate_price;

/// Catalog category of a campaign
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub campaign_id: i32,
    pub name_fr: String,
    pub name_nl: String,
    pub icon_path: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Orderable product of a campaign
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i32,
    pub campaign_id: i32,
    pub category_id: Option<i32>,
    pub code: String,
    pub name_fr: String,
    pub name_nl: String,
    pub description_fr: Option<String>,
    pub description_nl: Option<String>,
    pub price: Option<Decimal>,
    /// Cap on the units one customer may order over the campaign
    pub max_per_customer: Option<i32>,
    /// Cap on the units all customers together may order
    pub max_total: Option<i32>,
    pub is_active: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn name(&self, lang: Language) -> &str {
        lang.pick(&self.name_fr, &self.name_nl)
    }

    pub fn description(&self, lang: Language) -> Option<&str> {
        match lang {
            Language::Fr => self.description_fr.as_deref(),
            Language::Nl => self.description_nl.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 120, message = "French name is required"))]
    pub name_fr: String,
    #[validate(length(min = 1, max = 120, message = "Dutch name is required"))]
    pub name_nl: String,
    #[validate(length(max = 255))]
    pub icon_path: Option<String>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    pub category_id: Option<i32>,
    #[validate(length(min = 1, max = 50, message = "Product code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "French name is required"))]
    pub name_fr: String,
    #[validate(length(min = 1, max = 200, message = "Dutch name is required"))]
    pub name_nl: String,
    pub description_fr: Option<String>,
    pub description_nl: Option<String>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    #[validate(range(min = 1, message = "Per-customer maximum must be at least 1"))]
    pub max_per_customer: Option<i32>,
    #[validate(range(min = 1, message = "Total maximum must be at least 1"))]
    pub max_total: Option<i32>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Product as shown in the portal catalog
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub max_per_customer: Option<i32>,
}

/// Category block of the portal catalog; uncategorized products come last with no id
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogCategory {
    pub id: Option<i32>,
    pub name: String,
    pub icon_path: Option<String>,
    pub products: Vec<CatalogProduct>,
}

/// Response of GET /c/{uuid}/catalog
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogView {
    pub campaign: PublicCampaign,
    pub actor: ActorKind,
    pub language: Language,
    pub show_prices: bool,
    pub categories: Vec<CatalogCategory>,
}

/// Group active products under their categories, in display order
///
/// Categories without active products are dropped.
pub fn build_catalog(
    categories: &[Category],
    products: &[Product],
    lang: Language,
    include_prices: bool,
) -> Vec<CatalogCategory> {
    let to_entry = |product: &Product| CatalogProduct {
        code: product.code.clone(),
        name: product.name(lang).to_string(),
        description: product.description(lang).map(str::to_string),
        price: if include_prices { product.price } else { None },
        max_per_customer: product.max_per_customer,
    };

    let mut sorted: Vec<&Product> = products.iter().filter(|p| p.is_active).collect();
    sorted.sort_by_key(|p| (p.position, p.id));

    let mut ordered_categories: Vec<&Category> = categories.iter().collect();
    ordered_categories.sort_by_key(|c| (c.position, c.id));

    let mut blocks: Vec<CatalogCategory> = ordered_categories
        .into_iter()
        .map(|category| CatalogCategory {
            id: Some(category.id),
            name: lang.pick(&category.name_fr, &category.name_nl).to_string(),
            icon_path: category.icon_path.clone(),
            products: sorted
                .iter()
                .filter(|p| p.category_id == Some(category.id))
                .map(|p| to_entry(*p))
                .collect(),
        })
        .filter(|block| !block.products.is_empty())
        .collect();

    let known: Vec<i32> = categories.iter().map(|c| c.id).collect();
    let orphans: Vec<CatalogProduct> = sorted
        .iter()
        .filter(|p| p.category_id.map_or(true, |id| !known.contains(&id)))
        .map(|p| to_entry(*p))
        .collect();

    if !orphans.is_empty() {
        blocks.push(CatalogCategory {
            id: None,
            name: lang.pick("Autres produits", "Overige producten").to_string(),
            icon_path: None,
            products: orphans,
        });
    }

    blocks
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn product(id: i32, code: &str, category_id: Option<i32>) -> Product {
        Product {
            id,
            campaign_id: 1,
            category_id,
            code: code.to_string(),
            name_fr: format!("Produit {}", code),
            name_nl: format!("Product {}", code),
            description_fr: None,
            description_nl: None,
            price: Some(Decimal::new(1250, 2)),
            max_per_customer: None,
            max_total: None,
            is_active: true,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn category(id: i32, position: i32) -> Category {
        Category {
            id,
            campaign_id: 1,
            name_fr: format!("Catégorie {}", id),
            name_nl: format!("Categorie {}", id),
            icon_path: None,
            position,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_catalog_groups_and_orders() {
        let categories = vec![category(1, 2), category(2, 1), category(3, 0)];
        let mut hidden = fixtures::product(4, "HID", Some(1));
        hidden.is_active = false;
        let products = vec![
            fixtures::product(1, "A", Some(1)),
            fixtures::product(2, "B", Some(2)),
            fixtures::product(3, "C", None),
            hidden,
        ];

        let catalog = build_catalog(&categories, &products, Language::Nl, false);

        let ids: Vec<Option<i32>> = catalog.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![Some(2), Some(1), None]);
        assert_eq!(catalog[0].name, "Categorie 2");
        assert_eq!(catalog[1].products.len(), 1);
        assert_eq!(catalog[1].products[0].name, "Product A");
        assert_eq!(catalog[2].name, "Overige producten");
        assert!(catalog.iter().flat_map(|c| &c.products).all(|p| p.price.is_none()));
    }

    #[test]
    fn test_prices_only_when_requested() {
        let catalog = build_catalog(&[], &[fixtures::product(1, "A", None)], Language::Fr, true);
        assert_eq!(catalog[0].products[0].price, Some(dec!(12.50)));

        let body = serde_json::to_value(&build_catalog(&[], &[fixtures::product(1, "A", None)], Language::Fr, false))
            .unwrap();
        assert!(body[0]["products"][0].get("price").is_none());
    }

    #[test]
    fn test_product_request_validation() {
        let request: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "code": "P-100",
            "name_fr": "Crème solaire",
            "name_nl": "Zonnecrème",
            "price": "-1.00"
        }))
        .unwrap();
        assert!(request.is_active);
        assert!(request.validate().is_err());

        let request = CreateProductRequest { price: Some(dec!(3.99)), ..request };
        assert!(request.validate().is_ok());
    }
}
