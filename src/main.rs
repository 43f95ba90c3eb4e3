// Surf Raid API v0.1
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use surf_raid_api::auth::SessionVerifier;
use surf_raid_api::config::AppConfig;
use surf_raid_api::routes::{self, AppState};
use surf_raid_api::services::beach_filter::Beach;
use surf_raid_api::services::view_state::{SharedViewRegistry, ViewRegistry};
use surf_raid_api::{db, errors, services};

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;
/// Minimum number of connections kept alive in the database pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 2;

/// Registers the bearer session scheme referenced by the raid log paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Surf Raid API, OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Surf Raid API",
        version = "0.1.0",
        description = "Surf session logs (raid logs) with their forecast conditions and \
            alerts, plus per-session beach views that filter, score and page the \
            beach catalog.",
        license(name = "MIT"),
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Raid logs", description = "Surf session logs and their alerts"),
        (name = "Beach view", description = "Per-session beach filter, score and sort state"),
        (name = "Sponsors", description = "Forecast widget sponsors"),
    ),
    paths(
        routes::health::health_check,
        routes::raid_logs::list_raid_logs,
        routes::raid_logs::create_raid_log,
        routes::sponsors::list_sponsors,
        routes::view::get_view,
        routes::view::get_view_beaches,
        routes::view::reload_beaches,
        routes::view::set_filters,
        routes::view::set_scores,
        routes::view::set_sort,
        routes::view::set_page,
        routes::view::set_loading,
        routes::view::set_forecast,
        routes::view::set_good_beaches,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::sponsors::SponsorResponse,
            routes::view::ViewSnapshot,
            routes::view::BeachPage,
            routes::view::PageUpdate,
            routes::view::LoadingUpdate,
            services::raid_logs::RaidLogView,
            services::raid_logs::RegionView,
            services::raid_logs::ForecastView,
            services::raid_logs::WindView,
            services::raid_logs::SwellView,
            services::raid_logs::UserView,
            services::raid_logs::AlertRef,
            services::raid_logs::NewRaidLog,
            services::raid_logs::ForecastInput,
            services::raid_logs::WindInput,
            services::raid_logs::SwellInput,
            services::raid_logs::AlertConfigInput,
            services::beach_filter::Beach,
            services::beach_filter::BeachRegion,
            services::beach_filter::SharkAttack,
            services::beach_filter::BeachWithScore,
            services::beach_filter::BeachScore,
            services::beach_filter::FilterCriteria,
            services::beach_filter::LocationFilter,
            services::beach_filter::BeachSort,
            services::beach_filter::SortField,
            services::beach_filter::SortDirection,
            services::view_state::RegionConditions,
            services::view_state::GoodBeach,
            services::view_state::LoadingDomain,
            services::view_state::LoadingStates,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surf_raid_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // Set up database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Seed the catalog new view sessions start from; it can be reloaded later
    let beaches: Vec<Beach> = match db::queries::list_beaches(&pool).await {
        Ok(rows) => {
            if rows.is_empty() {
                tracing::warn!("No beaches found; view sessions start empty");
            }
            rows.into_iter().map(Beach::from).collect()
        }
        Err(e) => {
            tracing::error!("Failed to load beaches: {}", e);
            Vec::new()
        }
    };
    tracing::info!("Beach catalog seeded with {} beaches", beaches.len());

    let views: SharedViewRegistry = Arc::new(RwLock::new(ViewRegistry::new(beaches)));

    let app_state = AppState {
        pool,
        views,
        sessions: SessionVerifier::new(&config.session_secret),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
        ])
        .allow_headers(Any);

    let app = routes::router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
