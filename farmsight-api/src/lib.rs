//! farmsight-api library
//!
//! Turns periodic remote-sensing observations and weather forecasts
//! into weekly per-paddock grazing recommendations, with an auditable
//! job-run history. The HTTP layer, persistence and worker are thin
//! adapters around the ingestion, aggregation and decision services.

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use farmsight_common::NdviProvider;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod workers;

use services::thresholds::ThresholdStore;
use services::weather::OpenWeatherClient;

/// Application state shared across HTTP handlers and workers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Injected threshold access handle
    pub thresholds: ThresholdStore,
    /// Vegetation index provider (synthetic by default)
    pub ndvi: Arc<dyn NdviProvider>,
    /// Weather client; None means the synthetic forecast is used
    pub weather: Option<Arc<OpenWeatherClient>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        ndvi: Arc<dyn NdviProvider>,
        weather: Option<Arc<OpenWeatherClient>>,
    ) -> Self {
        let thresholds = ThresholdStore::new(db.clone());
        Self {
            db,
            thresholds,
            ndvi,
            weather,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(api::health::health))
        .route("/api/v1/farms", get(api::farms::list).post(api::farms::create))
        .route(
            "/api/v1/farms/:farm_id",
            get(api::farms::get)
                .patch(api::farms::update)
                .delete(api::farms::delete),
        )
        .route(
            "/api/v1/farms/:farm_id/paddocks",
            get(api::paddocks::list).post(api::paddocks::create),
        )
        .route("/api/v1/farms/:farm_id/paddocks/import", post(api::paddocks::import))
        .route(
            "/api/v1/paddocks/:paddock_id",
            patch(api::paddocks::update).delete(api::paddocks::delete),
        )
        .route(
            "/api/v1/farms/:farm_id/observations/dates",
            get(api::observations::dates),
        )
        .route(
            "/api/v1/farms/:farm_id/observations",
            get(api::observations::by_date),
        )
        .route(
            "/api/v1/paddocks/:paddock_id/observations",
            get(api::observations::series),
        )
        .route(
            "/api/v1/farms/:farm_id/weather/forecast",
            get(api::weather::forecast),
        )
        .route(
            "/api/v1/farms/:farm_id/recommendations/latest",
            get(api::recommendations::latest),
        )
        .route(
            "/api/v1/farms/:farm_id/recommendations",
            get(api::recommendations::by_week),
        )
        .route(
            "/api/v1/farms/:farm_id/recommendations/generate",
            post(api::recommendations::generate),
        )
        .route(
            "/api/v1/farms/:farm_id/jobs/ingest",
            post(api::jobs::run_ingest_pipeline),
        )
        .route("/api/v1/jobs/runs", get(api::jobs::runs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
