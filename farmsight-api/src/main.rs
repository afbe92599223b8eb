//! farmsight-api - Paddock Intelligence Service
//!
//! Materializes per-date vegetation-index observations from synthetic
//! imagery metadata, fetches weather forecasts, and generates weekly
//! per-paddock grazing recommendations over an HTTP API.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use farmsight_common::ndvi::SyntheticNdviProvider;
use tracing::info;

use farmsight_api::config::Config;
use farmsight_api::services::seed::seed_demo_data;
use farmsight_api::services::weather::OpenWeatherClient;
use farmsight_api::{build_router, workers, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::parse();

    info!("Starting farmsight-api v{}", env!("CARGO_PKG_VERSION"));

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let pool = farmsight_api::db::init_database_pool(&db_path).await?;

    let weather = match &config.openweather_api_key {
        Some(api_key) => {
            info!("OpenWeather client configured");
            Some(Arc::new(OpenWeatherClient::new(
                &config.openweather_base_url,
                api_key,
            )?))
        }
        None => {
            info!("No OpenWeather API key; using synthetic forecasts");
            None
        }
    };

    let state = AppState::new(pool, Arc::new(SyntheticNdviProvider), weather);

    state.thresholds.seed_defaults().await?;
    if config.seed_demo_data {
        seed_demo_data(&state.db).await?;
    }

    tokio::spawn(workers::run_weekly_recommendation_loop(state.clone()));

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Listening on http://{}", config.bind);
    info!("Health check: http://{}/api/v1/health", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
