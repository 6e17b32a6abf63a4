// Admin JSON endpoints backing the cascading customer filters, and the directory import

use axum::{
    extract::{Query, State},
    Json,
};

use crate::auth::AdminUser;
use crate::customers::{ClusterQuery, DirectoryError, ImportQuery, ImportSummary, RepresentativeOption, RepresentativeQuery};
use crate::error::ApiError;
use crate::models::Country;
use crate::AppState;

fn lookup_country(country: Country) -> Result<Country, ApiError> {
    if country.is_customer_country() {
        Ok(country)
    } else {
        Err(DirectoryError::InvalidCountry(country).into())
    }
}

/// Handler for GET /customers/api/clusters?country=
pub async fn list_clusters_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ClusterQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let country = lookup_country(query.country)?;
    let clusters = state.customers.list_clusters(country).await?;
    Ok(Json(clusters))
}

/// Handler for GET /customers/api/representatives?country=&cluster=
pub async fn list_representatives_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RepresentativeQuery>,
) -> Result<Json<Vec<RepresentativeOption>>, ApiError> {
    let country = lookup_country(query.country)?;
    let cluster = query.cluster.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let representatives = state.customers.list_representatives(country, cluster).await?;
    Ok(Json(representatives))
}

/// Handler for POST /admin/customers/import?country=
/// Refreshes the local cache from the directory
pub async fn import_customers_handler(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(query): Query<ImportQuery>,
) -> Result<Json<ImportSummary>, ApiError> {
    let country = lookup_country(query.country)?;

    let identities = state.directory.list_by_country(country).await?;
    let upserted = state.customers.import(&identities).await?;

    tracing::info!(
        "Admin {} imported {} of {} {} customers from the directory",
        admin.admin_id,
        upserted,
        identities.len(),
        country
    );

    Ok(Json(ImportSummary {
        country,
        fetched: identities.len(),
        upserted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_both_is_not_a_lookup_country() {
        assert_eq!(lookup_country(Country::Lu).unwrap(), Country::Lu);
        assert_eq!(lookup_country(Country::Both).unwrap_err().status_code(), StatusCode::BAD_REQUEST);
    }
}
