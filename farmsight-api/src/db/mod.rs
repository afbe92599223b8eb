//! Database access for farmsight-api
//!
//! One module per entity; free async functions generic over
//! `SqliteExecutor` so the same query runs on the pool or inside a
//! transaction.

pub mod farms;
pub mod job_runs;
pub mod observations;
pub mod paddocks;
pub mod recommendations;
pub mod scenes;
pub mod weather;

use std::path::Path;

use farmsight_common::Result;
use sqlx::SqlitePool;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables if they don't exist.
///
/// Child rows are cleaned up explicitly by the delete paths rather
/// than relying on the foreign_keys pragma being enabled.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS farms (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS paddocks (
            id TEXT PRIMARY KEY,
            farm_id TEXT NOT NULL REFERENCES farms(id),
            name TEXT NOT NULL,
            geom_geojson TEXT NOT NULL,
            area_ha REAL NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS satellite_scenes (
            id TEXT PRIMARY KEY,
            farm_id TEXT NOT NULL REFERENCES farms(id),
            source TEXT NOT NULL DEFAULT 'stac_sentinel2',
            scene_date TEXT NOT NULL,
            cloud_pct REAL,
            red_uri TEXT,
            nir_uri TEXT,
            mask_uri TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (farm_id, scene_date, source)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS paddock_observations (
            id TEXT PRIMARY KEY,
            paddock_id TEXT NOT NULL REFERENCES paddocks(id),
            obs_date TEXT NOT NULL,
            ndvi_mean REAL NOT NULL,
            ndvi_p10 REAL,
            ndvi_p50 REAL,
            ndvi_p90 REAL,
            cloud_pct REAL,
            quality_flag TEXT NOT NULL DEFAULT 'OK',
            created_at TEXT NOT NULL,
            UNIQUE (paddock_id, obs_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recommendations (
            id TEXT PRIMARY KEY,
            farm_id TEXT NOT NULL REFERENCES farms(id),
            created_for_week_start TEXT NOT NULL,
            summary_md TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (farm_id, created_for_week_start)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS paddock_recommendations (
            id TEXT PRIMARY KEY,
            recommendation_id TEXT NOT NULL REFERENCES recommendations(id),
            paddock_id TEXT NOT NULL REFERENCES paddocks(id),
            rec_type TEXT NOT NULL,
            message TEXT NOT NULL,
            severity TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weather_daily (
            id TEXT PRIMARY KEY,
            farm_id TEXT NOT NULL REFERENCES farms(id),
            date TEXT NOT NULL,
            rain_mm REAL NOT NULL,
            temp_min_c REAL NOT NULL,
            temp_max_c REAL NOT NULL,
            wind_kph REAL NOT NULL,
            source TEXT NOT NULL,
            fetched_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS config_thresholds (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_runs (
            id TEXT PRIMARY KEY,
            job_type TEXT NOT NULL,
            farm_id TEXT,
            status TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            stats_json TEXT NOT NULL DEFAULT '{}',
            error TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized");

    Ok(())
}
