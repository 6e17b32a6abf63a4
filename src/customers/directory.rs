// Customer Directory Adapter
//
// Resolves a customer number + country against the external customer registry.
// The registry is read-only for the portal and split into one table per country.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::customers::{CustomerIdentity, CustomerNumber, DirectoryError, DirectoryRow};
use crate::models::Country;

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Look up one active customer; `Ok(None)` means "not found"
    async fn find(
        &self,
        number: &CustomerNumber,
        country: Country,
    ) -> Result<Option<CustomerIdentity>, DirectoryError>;

    /// All active customers of a country
    async fn list_by_country(&self, country: Country) -> Result<Vec<CustomerIdentity>, DirectoryError>;
}

/// Directory backed by the registry tables, bounded by a per-call timeout
#[derive(Clone)]
pub struct PgCustomerDirectory {
    pool: PgPool,
    timeout: Duration,
}

impl PgCustomerDirectory {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    fn table_for(country: Country) -> Result<&'static str, DirectoryError> {
        match country {
            Country::Be => Ok("directory_customers_be"),
            Country::Lu => Ok("directory_customers_lu"),
            Country::Both => Err(DirectoryError::InvalidCountry(country)),
        }
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, DirectoryError>
    where
        F: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result.map_err(classify),
            Err(_) => Err(DirectoryError::Unavailable(format!(
                "no answer within {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

/// Connection-level failures mean the registry is unreachable
fn classify(err: sqlx::Error) -> DirectoryError {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => DirectoryError::Unavailable(err.to_string()),
        other => DirectoryError::DatabaseError(other),
    }
}

#[async_trait]
impl CustomerDirectory for PgCustomerDirectory {
    async fn find(
        &self,
        number: &CustomerNumber,
        country: Country,
    ) -> Result<Option<CustomerIdentity>, DirectoryError> {
        let table = Self::table_for(country)?;
        tracing::debug!("Directory lookup for {} in {}", number, country);

        // Prospects never reach the registry; they live in the local cache
        let row = if number.is_prospect() {
            self.bounded(
                sqlx::query_as::<_, DirectoryRow>(
                    r#"
                    SELECT customer_number, name, representative_id, representative_name, cluster, language
                    FROM customers
                    WHERE customer_number = $1 AND country = $2 AND is_prospect AND is_active
                    "#,
                )
                .bind(number.as_str())
                .bind(country)
                .fetch_optional(&self.pool),
            )
            .await?
        } else {
            let query = format!(
                "SELECT customer_number, name, representative_id, representative_name, cluster, language \
                 FROM {} WHERE customer_number = $1 AND is_active",
                table
            );
            self.bounded(
                sqlx::query_as::<_, DirectoryRow>(&query)
                    .bind(number.as_str())
                    .fetch_optional(&self.pool),
            )
            .await?
        };

        Ok(row.and_then(|row| row.into_identity(country)))
    }

    async fn list_by_country(&self, country: Country) -> Result<Vec<CustomerIdentity>, DirectoryError> {
        let table = Self::table_for(country)?;
        let query = format!(
            "SELECT customer_number, name, representative_id, representative_name, cluster, language \
             FROM {} WHERE is_active ORDER BY customer_number",
            table
        );

        let rows = self
            .bounded(sqlx::query_as::<_, DirectoryRow>(&query).fetch_all(&self.pool))
            .await?;

        tracing::debug!("Directory returned {} customers for {}", rows.len(), country);
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_identity(country))
            .collect())
    }
}

/// In-process directory used by tests and local runs
#[derive(Default)]
pub struct InMemoryCustomerDirectory {
    customers: RwLock<HashMap<(Country, CustomerNumber), CustomerIdentity>>,
    unavailable: AtomicBool,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, identity: CustomerIdentity) {
        let mut customers = self.customers.write().await;
        customers.insert((identity.country, identity.customer_number.clone()), identity);
    }

    /// Simulate the registry going down (or coming back)
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn ensure_available(&self, country: Country) -> Result<(), DirectoryError> {
        if !country.is_customer_country() {
            return Err(DirectoryError::InvalidCountry(country));
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("in-memory directory disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn find(
        &self,
        number: &CustomerNumber,
        country: Country,
    ) -> Result<Option<CustomerIdentity>, DirectoryError> {
        self.ensure_available(country)?;
        let customers = self.customers.read().await;
        Ok(customers.get(&(country, number.clone())).cloned())
    }

    async fn list_by_country(&self, country: Country) -> Result<Vec<CustomerIdentity>, DirectoryError> {
        self.ensure_available(country)?;
        let customers = self.customers.read().await;
        let mut matching: Vec<CustomerIdentity> = customers
            .values()
            .filter(|identity| identity.country == country)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.customer_number.cmp(&b.customer_number));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(number: &str, country: Country) -> CustomerIdentity {
        CustomerIdentity {
            customer_number: CustomerNumber::parse(number).unwrap(),
            country,
            name: format!("Customer {}", number),
            representative_id: None,
            representative_name: None,
            cluster: None,
            language: None,
            is_prospect: false,
        }
    }

    #[tokio::test]
    async fn test_find_is_scoped_by_country() {
        let directory = InMemoryCustomerDirectory::new();
        directory.insert(identity("123456", Country::Be)).await;

        let number = CustomerNumber::parse("123456").unwrap();
        assert!(directory.find(&number, Country::Be).await.unwrap().is_some());
        assert!(directory.find(&number, Country::Lu).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_is_not_not_found() {
        let directory = InMemoryCustomerDirectory::new();
        directory.set_available(false);

        let number = CustomerNumber::parse("123456").unwrap();
        let result = directory.find(&number, Country::Be).await;
        assert!(matches!(result, Err(DirectoryError::Unavailable(_))));

        directory.set_available(true);
        assert!(directory.find(&number, Country::Be).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_both_is_not_a_lookup_country() {
        let directory = InMemoryCustomerDirectory::new();
        let number = CustomerNumber::parse("123456").unwrap();
        let result = directory.find(&number, Country::Both).await;
        assert!(matches!(result, Err(DirectoryError::InvalidCountry(Country::Both))));
    }

    #[tokio::test]
    async fn test_list_by_country_sorted() {
        let directory = InMemoryCustomerDirectory::new();
        directory.insert(identity("300", Country::Be)).await;
        directory.insert(identity("100", Country::Be)).await;
        directory.insert(identity("200", Country::Lu)).await;

        let be = directory.list_by_country(Country::Be).await.unwrap();
        let numbers: Vec<&str> = be.iter().map(|c| c.customer_number.as_str()).collect();
        assert_eq!(numbers, vec!["100", "300"]);
    }

    #[test]
    fn test_table_for_country() {
        assert_eq!(PgCustomerDirectory::table_for(Country::Be).unwrap(), "directory_customers_be");
        assert_eq!(PgCustomerDirectory::table_for(Country::Lu).unwrap(), "directory_customers_lu");
        assert!(PgCustomerDirectory::table_for(Country::Both).is_err());
    }

    #[test]
    fn test_connection_errors_are_unavailability() {
        assert!(matches!(classify(sqlx::Error::PoolTimedOut), DirectoryError::Unavailable(_)));
        assert!(matches!(classify(sqlx::Error::RowNotFound), DirectoryError::DatabaseError(_)));
    }
}
