use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::campaigns::{Campaign, CampaignForm};

const CAMPAIGN_COLUMNS: &str = "id, uuid, name, title_fr, title_nl, description_fr, description_nl, country, \
     start_date, end_date, is_active, customer_assignment_mode, customer_list, order_password, \
     campaign_type, order_processing_mode, deferred_delivery, delivery_date, allow_prospects, \
     show_prices, global_quota, quota_per_customer, owner_id, created_at, updated_at";

/// Repository for campaign operations
#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a campaign and attach its collaborators in one transaction
    pub async fn create(
        &self,
        form: &CampaignForm,
        owner_id: i32,
        collaborator_ids: &[i32],
    ) -> Result<Campaign, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO campaigns (
                uuid, name, title_fr, title_nl, description_fr, description_nl, country,
                start_date, end_date, is_active, customer_assignment_mode, customer_list,
                order_password, campaign_type, order_processing_mode, deferred_delivery,
                delivery_date, allow_prospects, show_prices, global_quota, quota_per_customer, owner_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            RETURNING {}
            "#,
            CAMPAIGN_COLUMNS
        );

        let campaign = bind_form(sqlx::query_as::<_, Campaign>(&query).bind(Uuid::new_v4()), form)
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;

        for admin_id in collaborator_ids.iter().filter(|id| **id != owner_id) {
            sqlx::query(
                "INSERT INTO campaign_collaborators (campaign_id, admin_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(campaign.id)
            .bind(admin_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(campaign)
    }

    /// Replace every editable field of a campaign
    pub async fn update(&self, id: i32, form: &CampaignForm) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE campaigns
            SET name = $2, title_fr = $3, title_nl = $4, description_fr = $5, description_nl = $6,
                country = $7, start_date = $8, end_date = $9, is_active = $10,
                customer_assignment_mode = $11, customer_list = $12, order_password = $13,
                campaign_type = $14, order_processing_mode = $15, deferred_delivery = $16,
                delivery_date = $17, allow_prospects = $18, show_prices = $19,
                global_quota = $20, quota_per_customer = $21, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CAMPAIGN_COLUMNS
        );

        bind_form(sqlx::query_as::<_, Campaign>(&query).bind(id), form)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn set_active(&self, id: i32, is_active: bool) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!(
            "UPDATE campaigns SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            CAMPAIGN_COLUMNS
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {} FROM campaigns WHERE id = $1", CAMPAIGN_COLUMNS);
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {} FROM campaigns WHERE uuid = $1", CAMPAIGN_COLUMNS);
        sqlx::query_as::<_, Campaign>(&query)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
    }

    /// Load a campaign inside an admission transaction, locking its row
    ///
    /// Every admission for the same campaign queues on this lock until the
    /// holder commits or rolls back.
    pub async fn lock_by_uuid(
        &self,
        conn: &mut PgConnection,
        uuid: Uuid,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {} FROM campaigns WHERE uuid = $1 FOR UPDATE", CAMPAIGN_COLUMNS);
        sqlx::query_as::<_, Campaign>(&query)
            .bind(uuid)
            .fetch_optional(&mut *conn)
            .await
    }

    /// All campaigns, most recent start first
    pub async fn list(&self) -> Result<Vec<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM campaigns ORDER BY start_date DESC, id DESC",
            CAMPAIGN_COLUMNS
        );
        sqlx::query_as::<_, Campaign>(&query).fetch_all(&self.pool).await
    }

    pub async fn collaborator_ids(&self, campaign_id: i32) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT admin_id FROM campaign_collaborators WHERE campaign_id = $1 ORDER BY admin_id",
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Collaborators of several campaigns in one round-trip
    pub async fn collaborators_by_campaign(&self, campaign_ids: &[i32]) -> Result<HashMap<i32, Vec<i32>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (i32, i32)>(
            r#"
            SELECT campaign_id, admin_id
            FROM campaign_collaborators
            WHERE campaign_id = ANY($1)
            ORDER BY campaign_id, admin_id
            "#,
        )
        .bind(campaign_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<i32>> = HashMap::new();
        for (campaign_id, admin_id) in rows {
            grouped.entry(campaign_id).or_default().push(admin_id);
        }
        Ok(grouped)
    }
}

type CampaignQuery<'q> = sqlx::query::QueryAs<'q, sqlx::Postgres, Campaign, sqlx::postgres::PgArguments>;

/// Bind the form fields in column order (after one leading bind)
fn bind_form<'q>(query: CampaignQuery<'q>, form: &'q CampaignForm) -> CampaignQuery<'q> {
    query
        .bind(form.name.trim())
        .bind(form.title_fr.trim())
        .bind(form.title_nl.trim())
        .bind(form.description_fr.as_deref())
        .bind(form.description_nl.as_deref())
        .bind(form.country)
        .bind(form.start_date)
        .bind(form.end_date)
        .bind(form.is_active)
        .bind(form.customer_assignment_mode)
        .bind(form.customer_list.as_deref())
        .bind(form.order_password.as_deref())
        .bind(form.campaign_type)
        .bind(form.order_processing_mode)
        .bind(form.deferred_delivery)
        .bind(form.delivery_date)
        .bind(form.allow_prospects)
        .bind(form.show_prices)
        .bind(form.global_quota)
        .bind(form.quota_per_customer)
}
