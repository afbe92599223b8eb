//! Paddock database operations

use farmsight_common::Result;
use sqlx::{SqliteConnection, SqliteExecutor};

use crate::models::Paddock;

pub async fn insert<'e, E: SqliteExecutor<'e>>(db: E, paddock: &Paddock) -> Result<()> {
    sqlx::query(
        "INSERT INTO paddocks (id, farm_id, name, geom_geojson, area_ha, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&paddock.id)
    .bind(&paddock.farm_id)
    .bind(&paddock.name)
    .bind(&paddock.geom_geojson)
    .bind(paddock.area_ha)
    .bind(paddock.created_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn get<'e, E: SqliteExecutor<'e>>(db: E, paddock_id: &str) -> Result<Option<Paddock>> {
    let paddock = sqlx::query_as::<_, Paddock>("SELECT * FROM paddocks WHERE id = ?")
        .bind(paddock_id)
        .fetch_optional(db)
        .await?;
    Ok(paddock)
}

pub async fn list_for_farm<'e, E: SqliteExecutor<'e>>(db: E, farm_id: &str) -> Result<Vec<Paddock>> {
    let paddocks = sqlx::query_as::<_, Paddock>(
        "SELECT * FROM paddocks WHERE farm_id = ? ORDER BY created_at ASC",
    )
    .bind(farm_id)
    .fetch_all(db)
    .await?;
    Ok(paddocks)
}

pub async fn update<'e, E: SqliteExecutor<'e>>(db: E, paddock: &Paddock) -> Result<()> {
    sqlx::query("UPDATE paddocks SET name = ?, geom_geojson = ?, area_ha = ? WHERE id = ?")
        .bind(&paddock.name)
        .bind(&paddock.geom_geojson)
        .bind(paddock.area_ha)
        .bind(&paddock.id)
        .execute(db)
        .await?;
    Ok(())
}

/// Delete a paddock together with its observations and recommendation
/// rows. Run inside a transaction.
pub async fn delete_cascade(conn: &mut SqliteConnection, paddock_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM paddock_observations WHERE paddock_id = ?")
        .bind(paddock_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM paddock_recommendations WHERE paddock_id = ?")
        .bind(paddock_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM paddocks WHERE id = ?")
        .bind(paddock_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
