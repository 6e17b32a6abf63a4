use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::customers::CustomerNumber;
use crate::models::Country;
use crate::orders::{
    CustomerConsumption, NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, ProductConsumption,
};

const ORDER_COLUMNS: &str = "id, uuid, campaign_id, customer_number, customer_country, customer_name, \
     customer_email, representative_id, representative_name, language, total_items, status, \
     submission_nonce, comment, created_at";

/// Units of one product already ordered on a campaign
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductUsage {
    pub total: i64,
    pub customer: i64,
}

/// Repository for orders and their lines
///
/// Orders are insert-only: there is no update or delete here, and the
/// database rejects both with a trigger.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its lines on the admission transaction
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        order: &NewOrder,
        lines: &[NewOrderLine],
    ) -> Result<(Order, Vec<OrderLine>), sqlx::Error> {
        let total_items: i32 = lines.iter().map(|l| l.quantity).sum();

        let query = format!(
            r#"
            INSERT INTO orders (
                uuid, campaign_id, customer_number, customer_country, customer_name, customer_email,
                representative_id, representative_name, language, total_items, status,
                submission_nonce, comment
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );

        let created = sqlx::query_as::<_, Order>(&query)
            .bind(Uuid::new_v4())
            .bind(order.campaign_id)
            .bind(order.customer.customer_number.as_str())
            .bind(order.customer.country)
            .bind(&order.customer.name)
            .bind(order.customer_email.trim())
            .bind(order.representative_id.as_deref())
            .bind(order.representative_name.as_deref())
            .bind(order.language)
            .bind(total_items)
            .bind(order.status)
            .bind(order.submission_nonce)
            .bind(order.comment.as_deref())
            .fetch_one(&mut *conn)
            .await?;

        let mut inserted = Vec::with_capacity(lines.len());
        for line in lines {
            let row = sqlx::query_as::<_, OrderLine>(
                r#"
                INSERT INTO order_lines (order_id, product_id, product_code, product_name, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, order_id, product_id, product_code, product_name, quantity
                "#,
            )
            .bind(created.id)
            .bind(line.product_id)
            .bind(&line.product_code)
            .bind(&line.product_name)
            .bind(line.quantity)
            .fetch_one(&mut *conn)
            .await?;
            inserted.push(row);
        }

        Ok((created, inserted))
    }

    pub async fn find_by_nonce(
        &self,
        conn: &mut PgConnection,
        campaign_id: i32,
        nonce: Uuid,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM orders WHERE campaign_id = $1 AND submission_nonce = $2",
            ORDER_COLUMNS
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(campaign_id)
            .bind(nonce)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {} FROM orders WHERE uuid = $1", ORDER_COLUMNS);
        sqlx::query_as::<_, Order>(&query)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn lines(&self, conn: &mut PgConnection, order_id: i32) -> Result<Vec<OrderLine>, sqlx::Error> {
        sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, product_id, product_code, product_name, quantity
            FROM order_lines
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await
    }

    /// Lines of several orders, grouped by order id
    pub async fn lines_for(&self, order_ids: &[i32]) -> Result<HashMap<i32, Vec<OrderLine>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, product_id, product_code, product_name, quantity
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderLine>> = HashMap::new();
        for line in rows {
            grouped.entry(line.order_id).or_default().push(line);
        }
        Ok(grouped)
    }

    /// Orders of a campaign, newest first, optionally filtered by status
    pub async fn list_by_campaign(
        &self,
        campaign_id: i32,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let orders = match status {
            Some(status_filter) => {
                let query = format!(
                    "SELECT {} FROM orders WHERE campaign_id = $1 AND status = $2 ORDER BY created_at DESC, id DESC",
                    ORDER_COLUMNS
                );
                sqlx::query_as::<_, Order>(&query)
                    .bind(campaign_id)
                    .bind(status_filter)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {} FROM orders WHERE campaign_id = $1 ORDER BY created_at DESC, id DESC",
                    ORDER_COLUMNS
                );
                sqlx::query_as::<_, Order>(&query)
                    .bind(campaign_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(orders)
    }

    /// Units already ordered per product, overall and for one customer
    pub async fn product_usage(
        &self,
        conn: &mut PgConnection,
        product_ids: &[i32],
        customer_number: &CustomerNumber,
        country: Country,
    ) -> Result<HashMap<i32, ProductUsage>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (i32, i64, i64)>(
            r#"
            SELECT
                l.product_id,
                COALESCE(SUM(l.quantity), 0)::BIGINT,
                COALESCE(SUM(l.quantity) FILTER (
                    WHERE o.customer_number = $2 AND o.customer_country = $3
                ), 0)::BIGINT
            FROM order_lines l
            JOIN orders o ON o.id = l.order_id
            WHERE l.product_id = ANY($1)
            GROUP BY l.product_id
            "#,
        )
        .bind(product_ids)
        .bind(customer_number.as_str())
        .bind(country)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, total, customer)| (product_id, ProductUsage { total, customer }))
            .collect())
    }

    pub async fn consumption_by_customer(&self, campaign_id: i32) -> Result<Vec<CustomerConsumption>, sqlx::Error> {
        sqlx::query_as::<_, CustomerConsumption>(
            r#"
            SELECT o.customer_number, o.customer_country, COALESCE(SUM(l.quantity), 0)::BIGINT AS consumed
            FROM orders o
            JOIN order_lines l ON l.order_id = o.id
            WHERE o.campaign_id = $1
            GROUP BY o.customer_number, o.customer_country
            ORDER BY consumed DESC, o.customer_number
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn consumption_by_product(&self, campaign_id: i32) -> Result<Vec<ProductConsumption>, sqlx::Error> {
        sqlx::query_as::<_, ProductConsumption>(
            r#"
            SELECT p.id AS product_id, p.code AS product_code, p.max_total, p.max_per_customer,
                   COALESCE(SUM(l.quantity), 0)::BIGINT AS consumed
            FROM products p
            LEFT JOIN order_lines l ON l.product_id = p.id
            WHERE p.campaign_id = $1
            GROUP BY p.id, p.code, p.max_total, p.max_per_customer
            ORDER BY p.position, p.id
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
    }
}
