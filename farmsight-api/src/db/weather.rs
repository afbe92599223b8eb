//! Daily weather forecast database operations
//!
//! A successful fetch fully replaces the stored forecast for the farm,
//! so writers call `delete_for_farm` and `insert` inside one
//! transaction.

use farmsight_common::Result;
use sqlx::SqliteExecutor;

use crate::models::WeatherDaily;

pub async fn insert<'e, E: SqliteExecutor<'e>>(db: E, day: &WeatherDaily) -> Result<()> {
    sqlx::query(
        "INSERT INTO weather_daily \
         (id, farm_id, date, rain_mm, temp_min_c, temp_max_c, wind_kph, source, fetched_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&day.id)
    .bind(&day.farm_id)
    .bind(day.date)
    .bind(day.rain_mm)
    .bind(day.temp_min_c)
    .bind(day.temp_max_c)
    .bind(day.wind_kph)
    .bind(&day.source)
    .bind(day.fetched_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_for_farm<'e, E: SqliteExecutor<'e>>(db: E, farm_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM weather_daily WHERE farm_id = ?")
        .bind(farm_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_for_farm<'e, E: SqliteExecutor<'e>>(db: E, farm_id: &str) -> Result<Vec<WeatherDaily>> {
    let rows = sqlx::query_as::<_, WeatherDaily>(
        "SELECT * FROM weather_daily WHERE farm_id = ? ORDER BY date ASC, fetched_at DESC",
    )
    .bind(farm_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Earliest `limit` forecast days for a farm
pub async fn first_days<'e, E: SqliteExecutor<'e>>(
    db: E,
    farm_id: &str,
    limit: i64,
) -> Result<Vec<WeatherDaily>> {
    let rows = sqlx::query_as::<_, WeatherDaily>(
        "SELECT * FROM weather_daily WHERE farm_id = ? ORDER BY date ASC LIMIT ?",
    )
    .bind(farm_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
