//! Satellite scene database operations

use chrono::NaiveDate;
use farmsight_common::Result;
use sqlx::SqliteExecutor;

use crate::models::SatelliteScene;

pub async fn insert<'e, E: SqliteExecutor<'e>>(db: E, scene: &SatelliteScene) -> Result<()> {
    sqlx::query(
        "INSERT INTO satellite_scenes \
         (id, farm_id, source, scene_date, cloud_pct, red_uri, nir_uri, mask_uri, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&scene.id)
    .bind(&scene.farm_id)
    .bind(&scene.source)
    .bind(scene.scene_date)
    .bind(scene.cloud_pct)
    .bind(&scene.red_uri)
    .bind(&scene.nir_uri)
    .bind(&scene.mask_uri)
    .bind(scene.created_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn get<'e, E: SqliteExecutor<'e>>(db: E, scene_id: &str) -> Result<Option<SatelliteScene>> {
    let scene = sqlx::query_as::<_, SatelliteScene>("SELECT * FROM satellite_scenes WHERE id = ?")
        .bind(scene_id)
        .fetch_optional(db)
        .await?;
    Ok(scene)
}

/// Look up a scene by its natural key (farm, date, source)
pub async fn find_by_key<'e, E: SqliteExecutor<'e>>(
    db: E,
    farm_id: &str,
    scene_date: NaiveDate,
    source: &str,
) -> Result<Option<SatelliteScene>> {
    let scene = sqlx::query_as::<_, SatelliteScene>(
        "SELECT * FROM satellite_scenes WHERE farm_id = ? AND scene_date = ? AND source = ?",
    )
    .bind(farm_id)
    .bind(scene_date)
    .bind(source)
    .fetch_optional(db)
    .await?;
    Ok(scene)
}
