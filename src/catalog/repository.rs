use sqlx::{PgConnection, PgPool};

use crate::catalog::{Category, CreateCategoryRequest, CreateProductRequest, Product};

const PRODUCT_COLUMNS: &str = "id, campaign_id, category_id, code, name_fr, name_nl, description_fr, \
     description_nl, price, max_per_customer, max_total, is_active, position, created_at, updated_at";

/// Repository for categories and products
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_category(
        &self,
        campaign_id: i32,
        request: &CreateCategoryRequest,
    ) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (campaign_id, name_fr, name_nl, icon_path, position)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, campaign_id, name_fr, name_nl, icon_path, position, created_at
            "#,
        )
        .bind(campaign_id)
        .bind(request.name_fr.trim())
        .bind(request.name_nl.trim())
        .bind(request.icon_path.as_deref())
        .bind(request.position)
        .fetch_one(&self.pool)
        .await
    }

    /// Whether `category_id` exists and belongs to `campaign_id`
    pub async fn category_belongs_to(&self, category_id: i32, campaign_id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1 AND campaign_id = $2)",
        )
        .bind(category_id)
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Insert a product; a duplicate code in the same campaign is a unique violation
    pub async fn create_product(
        &self,
        campaign_id: i32,
        request: &CreateProductRequest,
    ) -> Result<Product, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO products (
                campaign_id, category_id, code, name_fr, name_nl, description_fr, description_nl,
                price, max_per_customer, max_total, is_active, position
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(campaign_id)
            .bind(request.category_id)
            .bind(request.code.trim())
            .bind(request.name_fr.trim())
            .bind(request.name_nl.trim())
            .bind(request.description_fr.as_deref())
            .bind(request.description_nl.as_deref())
            .bind(request.price)
            .bind(request.max_per_customer)
            .bind(request.max_total)
            .bind(request.is_active)
            .bind(request.position)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn set_product_active(&self, id: i32, is_active: bool) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_categories(&self, campaign_id: i32) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, campaign_id, name_fr, name_nl, icon_path, position, created_at
            FROM categories
            WHERE campaign_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_active_products(&self, campaign_id: i32) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM products WHERE campaign_id = $1 AND is_active ORDER BY position, id",
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(campaign_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Active products of the campaign among `codes`, read on the caller's connection
    pub async fn find_active_by_codes(
        &self,
        conn: &mut PgConnection,
        campaign_id: i32,
        codes: &[String],
    ) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM products WHERE campaign_id = $1 AND is_active AND code = ANY($2)",
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(campaign_id)
            .bind(codes)
            .fetch_all(&mut *conn)
            .await
    }
}
