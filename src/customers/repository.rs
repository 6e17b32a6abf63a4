use sqlx::PgPool;

use crate::customers::{CustomerIdentity, CustomerNumber, ProspectRegistration, RepresentativeOption};
use crate::models::Country;

/// Repository for the local customer cache
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh the cached copy of a directory identity
    pub async fn upsert_identity(&self, identity: &CustomerIdentity) -> Result<(), sqlx::Error> {
        upsert(&self.pool, identity).await
    }

    /// Refresh the cache with a full directory listing, in one transaction
    pub async fn import(&self, identities: &[CustomerIdentity]) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for identity in identities {
            upsert(&mut *tx, identity).await?;
        }
        tx.commit().await?;

        tracing::info!("Imported {} customers into the cache", identities.len());
        Ok(identities.len())
    }

    /// Allocate a star-prefixed number and store the prospect in the cache
    pub async fn register_prospect(
        &self,
        form: &ProspectRegistration,
    ) -> Result<CustomerIdentity, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let sequence: i64 = sqlx::query_scalar("SELECT nextval('prospect_number_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let number = CustomerNumber::prospect(sequence);

        sqlx::query(
            r#"
            INSERT INTO customers (customer_number, country, name, language, email, phone, vat_number, is_prospect)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            "#,
        )
        .bind(number.as_str())
        .bind(form.country)
        .bind(form.company_name.trim())
        .bind(form.lang.map(|lang| lang.as_str()))
        .bind(form.email.trim())
        .bind(form.phone.as_deref())
        .bind(form.vat_number.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Registered prospect {} ({})", number, form.country);
        Ok(CustomerIdentity {
            customer_number: number,
            country: form.country,
            name: form.company_name.trim().to_string(),
            representative_id: None,
            representative_name: None,
            cluster: None,
            language: form.lang,
            is_prospect: true,
        })
    }

    /// Distinct clusters of active customers in a country
    pub async fn list_clusters(&self, country: Country) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT cluster
            FROM customers
            WHERE country = $1 AND cluster IS NOT NULL AND is_active
            ORDER BY cluster
            "#,
        )
        .bind(country)
        .fetch_all(&self.pool)
        .await
    }

    /// Distinct representatives of a country, optionally within one cluster
    pub async fn list_representatives(
        &self,
        country: Country,
        cluster: Option<&str>,
    ) -> Result<Vec<RepresentativeOption>, sqlx::Error> {
        sqlx::query_as::<_, RepresentativeOption>(
            r#"
            SELECT DISTINCT representative_id, representative_name
            FROM customers
            WHERE country = $1
              AND representative_id IS NOT NULL
              AND is_active
              AND ($2::text IS NULL OR cluster = $2)
            ORDER BY representative_name NULLS LAST, representative_id
            "#,
        )
        .bind(country)
        .bind(cluster)
        .fetch_all(&self.pool)
        .await
    }
}

async fn upsert<'e, E>(executor: E, identity: &CustomerIdentity) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO customers
            (customer_number, country, name, representative_id, representative_name, cluster, language, is_prospect)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (customer_number, country) DO UPDATE
        SET name = EXCLUDED.name,
            representative_id = EXCLUDED.representative_id,
            representative_name = EXCLUDED.representative_name,
            cluster = EXCLUDED.cluster,
            language = COALESCE(EXCLUDED.language, customers.language),
            is_active = TRUE,
            updated_at = NOW()
        "#,
    )
    .bind(identity.customer_number.as_str())
    .bind(identity.country)
    .bind(&identity.name)
    .bind(identity.representative_id.as_deref())
    .bind(identity.representative_name.as_deref())
    .bind(identity.cluster.as_deref())
    .bind(identity.language.map(|lang| lang.as_str()))
    .bind(identity.is_prospect)
    .execute(executor)
    .await?;

    Ok(())
}
