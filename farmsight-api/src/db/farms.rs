//! Farm database operations

use farmsight_common::Result;
use sqlx::{SqliteConnection, SqliteExecutor};

use crate::models::Farm;

pub async fn insert<'e, E: SqliteExecutor<'e>>(db: E, farm: &Farm) -> Result<()> {
    sqlx::query(
        "INSERT INTO farms (id, name, description, latitude, longitude, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&farm.id)
    .bind(&farm.name)
    .bind(&farm.description)
    .bind(farm.latitude)
    .bind(farm.longitude)
    .bind(farm.created_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn get<'e, E: SqliteExecutor<'e>>(db: E, farm_id: &str) -> Result<Option<Farm>> {
    let farm = sqlx::query_as::<_, Farm>("SELECT * FROM farms WHERE id = ?")
        .bind(farm_id)
        .fetch_optional(db)
        .await?;
    Ok(farm)
}

pub async fn list<'e, E: SqliteExecutor<'e>>(db: E) -> Result<Vec<Farm>> {
    let farms = sqlx::query_as::<_, Farm>("SELECT * FROM farms ORDER BY created_at DESC")
        .fetch_all(db)
        .await?;
    Ok(farms)
}

pub async fn list_ids<'e, E: SqliteExecutor<'e>>(db: E) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>("SELECT id FROM farms ORDER BY created_at ASC")
        .fetch_all(db)
        .await?;
    Ok(ids)
}

pub async fn update<'e, E: SqliteExecutor<'e>>(db: E, farm: &Farm) -> Result<()> {
    sqlx::query(
        "UPDATE farms SET name = ?, description = ?, latitude = ?, longitude = ? WHERE id = ?",
    )
    .bind(&farm.name)
    .bind(&farm.description)
    .bind(farm.latitude)
    .bind(farm.longitude)
    .bind(&farm.id)
    .execute(db)
    .await?;
    Ok(())
}

/// Delete a farm and every dependent row (paddocks, observations,
/// scenes, weather, recommendations). Run inside a transaction.
pub async fn delete_cascade(conn: &mut SqliteConnection, farm_id: &str) -> Result<()> {
    sqlx::query(
        "DELETE FROM paddock_recommendations WHERE recommendation_id IN \
         (SELECT id FROM recommendations WHERE farm_id = ?)",
    )
    .bind(farm_id)
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM recommendations WHERE farm_id = ?")
        .bind(farm_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "DELETE FROM paddock_observations WHERE paddock_id IN \
         (SELECT id FROM paddocks WHERE farm_id = ?)",
    )
    .bind(farm_id)
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM paddocks WHERE farm_id = ?")
        .bind(farm_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM satellite_scenes WHERE farm_id = ?")
        .bind(farm_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM weather_daily WHERE farm_id = ?")
        .bind(farm_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM farms WHERE id = ?")
        .bind(farm_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
