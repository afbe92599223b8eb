//! Paddock observation database operations
//!
//! Observations are keyed by (paddock_id, obs_date); writes go through
//! `upsert` so re-aggregating a scene updates rows in place instead of
//! duplicating them.

use chrono::NaiveDate;
use farmsight_common::Result;
use sqlx::SqliteExecutor;

use crate::models::{PaddockObservation, QualityFlag};

/// Observation joined with its paddock, for the per-date farm view
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FarmObservationRow {
    pub paddock_id: String,
    pub paddock_name: String,
    pub ndvi_mean: f64,
    pub cloud_pct: Option<f64>,
    pub quality_flag: QualityFlag,
}

/// Insert or update the observation for (paddock_id, obs_date).
/// The existing row id and created_at are preserved on update.
pub async fn upsert<'e, E: SqliteExecutor<'e>>(db: E, obs: &PaddockObservation) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO paddock_observations
            (id, paddock_id, obs_date, ndvi_mean, ndvi_p10, ndvi_p50, ndvi_p90,
             cloud_pct, quality_flag, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(paddock_id, obs_date) DO UPDATE SET
            ndvi_mean = excluded.ndvi_mean,
            ndvi_p10 = excluded.ndvi_p10,
            ndvi_p50 = excluded.ndvi_p50,
            ndvi_p90 = excluded.ndvi_p90,
            cloud_pct = excluded.cloud_pct,
            quality_flag = excluded.quality_flag
        "#,
    )
    .bind(&obs.id)
    .bind(&obs.paddock_id)
    .bind(obs.obs_date)
    .bind(obs.ndvi_mean)
    .bind(obs.ndvi_p10)
    .bind(obs.ndvi_p50)
    .bind(obs.ndvi_p90)
    .bind(obs.cloud_pct)
    .bind(obs.quality_flag)
    .bind(obs.created_at)
    .execute(db)
    .await?;
    Ok(())
}

/// Most recent observations for a paddock, newest first
pub async fn recent_for_paddock<'e, E: SqliteExecutor<'e>>(
    db: E,
    paddock_id: &str,
    limit: i64,
) -> Result<Vec<PaddockObservation>> {
    let rows = sqlx::query_as::<_, PaddockObservation>(
        "SELECT * FROM paddock_observations WHERE paddock_id = ? ORDER BY obs_date DESC LIMIT ?",
    )
    .bind(paddock_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Full time series for a paddock, oldest first
pub async fn series_for_paddock<'e, E: SqliteExecutor<'e>>(
    db: E,
    paddock_id: &str,
) -> Result<Vec<PaddockObservation>> {
    let rows = sqlx::query_as::<_, PaddockObservation>(
        "SELECT * FROM paddock_observations WHERE paddock_id = ? ORDER BY obs_date ASC",
    )
    .bind(paddock_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Distinct observation dates across a farm's paddocks, newest first
pub async fn distinct_dates_for_farm<'e, E: SqliteExecutor<'e>>(
    db: E,
    farm_id: &str,
) -> Result<Vec<NaiveDate>> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT DISTINCT o.obs_date FROM paddock_observations o \
         JOIN paddocks p ON p.id = o.paddock_id \
         WHERE p.farm_id = ? ORDER BY o.obs_date DESC",
    )
    .bind(farm_id)
    .fetch_all(db)
    .await?;
    Ok(dates)
}

/// All observations for a farm on one date, with paddock names,
/// ordered by paddock name
pub async fn for_farm_on_date<'e, E: SqliteExecutor<'e>>(
    db: E,
    farm_id: &str,
    obs_date: NaiveDate,
) -> Result<Vec<FarmObservationRow>> {
    let rows = sqlx::query_as::<_, FarmObservationRow>(
        "SELECT o.paddock_id, p.name AS paddock_name, o.ndvi_mean, o.cloud_pct, o.quality_flag \
         FROM paddock_observations o \
         JOIN paddocks p ON p.id = o.paddock_id \
         WHERE p.farm_id = ? AND o.obs_date = ? \
         ORDER BY p.name ASC",
    )
    .bind(farm_id)
    .bind(obs_date)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
