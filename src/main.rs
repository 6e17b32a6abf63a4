pub mod access;
pub mod auth;
pub mod campaigns;
pub mod catalog;
pub mod config;
pub mod customers;
pub mod db;
pub mod error;
pub mod i18n;
pub mod models;
pub mod orders;
pub mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use access::AccessResolver;
use auth::TokenService;
use campaigns::CampaignRepository;
use catalog::CatalogRepository;
use config::AppConfig;
use customers::{CustomerDirectory, CustomerRepository, PgCustomerDirectory};
use orders::{ExportDispatcher, OrderRepository, OrderService, TracingExportDispatcher};

/// OpenAPI documentation of the customer-facing portal
#[derive(OpenApi)]
#[openapi(
    paths(
        access::handlers::landing_handler,
        access::handlers::identify_handler,
        access::handlers::register_prospect_handler,
        access::handlers::representative_landing_handler,
        access::handlers::representative_identify_handler,
        catalog::handlers::catalog_handler,
        orders::handlers::checkout_handler,
        orders::handlers::submit_order_handler,
        orders::handlers::get_order_handler,
    ),
    components(
        schemas(
            campaigns::PublicCampaign,
            campaigns::CampaignStatus,
            campaigns::CampaignType,
            campaigns::AssignmentMode,
            access::IdentifyRequest,
            access::IdentifyResponse,
            access::ActorKind,
            access::DenyReason,
            access::handlers::RepresentativeLanding,
            customers::ProspectRegistration,
            customers::CustomerIdentity,
            customers::CustomerNumber,
            catalog::CatalogView,
            catalog::CatalogCategory,
            catalog::CatalogProduct,
            orders::CartLine,
            orders::CheckoutRequest,
            orders::CheckoutPreview,
            orders::SubmitOrderRequest,
            orders::OrderResponse,
            orders::OrderLineResponse,
            orders::OrderStatus,
            orders::QuotaScope,
            models::Country,
            i18n::Language,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "portal", description = "Campaign identification and catalog"),
        (name = "orders", description = "Checkout and order admission")
    ),
    info(
        title = "Promotional Campaign Portal API",
        version = "1.0.0",
        description = "Customer and representative ordering on time-boxed promotional campaigns"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenService>,
    pub directory: Arc<dyn CustomerDirectory>,
    pub campaigns: CampaignRepository,
    pub catalog: CatalogRepository,
    pub customers: CustomerRepository,
    pub access: AccessResolver,
    pub order_service: OrderService,
}

impl AppState {
    /// State backed by the Postgres directory tables and the logging export signal
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        let directory: Arc<dyn CustomerDirectory> =
            Arc::new(PgCustomerDirectory::new(db.clone(), config.directory_timeout()));
        Self::with_collaborators(db, config, directory, Arc::new(TracingExportDispatcher))
    }

    /// State with explicit directory and export collaborators
    pub fn with_collaborators(
        db: PgPool,
        config: AppConfig,
        directory: Arc<dyn CustomerDirectory>,
        exporter: Arc<dyn ExportDispatcher>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.session_ttl_secs));
        let campaigns = CampaignRepository::new(db.clone());
        let catalog = CatalogRepository::new(db.clone());
        let access = AccessResolver::new(directory.clone());
        let order_service = OrderService::new(
            db.clone(),
            campaigns.clone(),
            catalog.clone(),
            OrderRepository::new(db.clone()),
            access.clone(),
            exporter,
        );

        Self {
            customers: CustomerRepository::new(db.clone()),
            db,
            tokens,
            directory,
            campaigns,
            catalog,
            access,
            order_service,
        }
    }
}

/// Creates and configures the application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let portal = Router::new()
        .route(
            "/c/:uuid",
            get(access::handlers::landing_handler).post(access::handlers::identify_handler),
        )
        .route("/c/:uuid/prospect", post(access::handlers::register_prospect_handler))
        .route("/c/:uuid/rep", get(access::handlers::representative_landing_handler))
        .route(
            "/c/:uuid/rep/identify",
            post(access::handlers::representative_identify_handler),
        )
        .route("/c/:uuid/catalog", get(catalog::handlers::catalog_handler))
        .route("/c/:uuid/checkout", post(orders::handlers::checkout_handler))
        .route("/c/:uuid/order/submit", post(orders::handlers::submit_order_handler))
        .route("/c/:uuid/order/:order_uuid", get(orders::handlers::get_order_handler));

    let admin = Router::new()
        .route(
            "/admin/campaigns",
            get(campaigns::handlers::list_campaigns_handler).post(campaigns::handlers::create_campaign_handler),
        )
        .route(
            "/admin/campaigns/:id",
            get(campaigns::handlers::get_campaign_handler).put(campaigns::handlers::update_campaign_handler),
        )
        .route(
            "/admin/campaigns/:id/active",
            patch(campaigns::handlers::toggle_campaign_handler),
        )
        .route("/admin/campaigns/:id/quota", get(campaigns::handlers::quota_report_handler))
        .route(
            "/admin/campaigns/:id/orders",
            get(orders::handlers::list_campaign_orders_handler),
        )
        .route(
            "/admin/campaigns/:id/categories",
            post(catalog::handlers::create_category_handler),
        )
        .route(
            "/admin/campaigns/:id/products",
            post(catalog::handlers::create_product_handler),
        )
        .route("/admin/products/:id/active", patch(catalog::handlers::toggle_product_handler))
        .route(
            "/admin/customers/import",
            post(customers::handlers::import_customers_handler),
        )
        .route("/customers/api/clusters", get(customers::handlers::list_clusters_handler))
        .route(
            "/customers/api/representatives",
            get(customers::handlers::list_representatives_handler),
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(portal)
        .merge(admin)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Promotional campaign portal - Starting...");

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config).await?;
    db::run_migrations(&db_pool).await?;

    let addr = config.bind_address();
    let app = create_router(AppState::new(db_pool, config));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Portal is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
