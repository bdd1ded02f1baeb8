pub mod auth;
pub mod errors;
pub mod middleware;
pub mod params;
pub mod routes;

use std::sync::Arc;
use axum::{
    http::{HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::ResponseCache;
use crate::config::AppConfig;
use crate::db::Database;
use crate::errors::CostIntelError;
use auth::ApiKeyAuthorizer;
use middleware::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub cache: ResponseCache,
    pub auth: Arc<ApiKeyAuthorizer>,
    pub rate_limiter: RateLimiter,
    pub cors_origins: Arc<Vec<String>>,
}

impl AppState {
    /// State with auth, rate limiting and caching switched off.
    pub fn open(db: Database) -> Self {
        Self {
            db,
            cache: ResponseCache::disabled(),
            auth: Arc::new(ApiKeyAuthorizer::disabled()),
            rate_limiter: RateLimiter::disabled(),
            cors_origins: Arc::new(Vec::new()),
        }
    }

    pub fn from_config(db: Database, config: &AppConfig) -> Self {
        Self {
            db,
            cache: ResponseCache::new(&config.cache),
            auth: Arc::new(ApiKeyAuthorizer::new(&config.auth)),
            rate_limiter: RateLimiter::new(&config.rate_limit),
            cors_origins: Arc::new(config.cors.allowed_origins.clone()),
        }
    }
}

pub async fn create_app_state(config: &AppConfig) -> Result<AppState, CostIntelError> {
    let db = Database::new(&config.database.path)?;
    let state = AppState::from_config(db, config);
    info!(
        db = %config.database.path,
        auth = state.auth.is_enabled(),
        cache = state.cache.is_enabled(),
        rate_limit = state.rate_limiter.is_enabled(),
        "Application state ready"
    );
    Ok(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(middleware::REQUEST_ID_HEADER)]);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/costs/aggregate", get(routes::costs::aggregate))
        .route("/costs/overview", get(routes::costs::overview))
        .route("/dimensions/cost-centers", get(routes::costs::list_cost_centers))
        .route("/dimensions/projects", get(routes::costs::list_projects))
        .route("/dimensions/categories", get(routes::costs::list_categories))
        .route("/budgets/variance", get(routes::budgets::variance))
        .route("/waste/ranking", get(routes::analytics::waste_ranking))
        .route("/anomalies/detect", get(routes::analytics::detect_anomalies))
        .route("/opportunities/quick-wins", get(routes::analytics::quick_wins))
        .route("/simulations/run", post(routes::simulations::run))
        .route("/simulations/compare", post(routes::simulations::compare));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.cors_origins))
                .layer(axum::middleware::from_fn(middleware::request_context))
                .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::rate_limit)),
        )
        .with_state(state)
}
