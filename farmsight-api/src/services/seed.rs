//! Demo data seeding for an empty database

use farmsight_common::geometry::polygon_area_hectares;
use farmsight_common::{time, Result};
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::models::{Farm, Paddock};

/// Create a demo farm with three paddocks if no farm exists yet
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<()> {
    if !db::farms::list(pool).await?.is_empty() {
        return Ok(());
    }

    let farm = Farm {
        id: Uuid::new_v4().to_string(),
        name: "Demo Farm".to_string(),
        description: Some("Seeded farm for dev-facing mode".to_string()),
        latitude: -36.85,
        longitude: 174.76,
        created_at: time::now(),
    };

    let polygons = [
        (
            "Paddock A",
            json!({
                "type": "Polygon",
                "coordinates": [[
                    [174.7500, -36.8500],
                    [174.7520, -36.8500],
                    [174.7520, -36.8485],
                    [174.7500, -36.8485],
                    [174.7500, -36.8500],
                ]],
            }),
        ),
        (
            "Paddock B",
            json!({
                "type": "Polygon",
                "coordinates": [[
                    [174.7530, -36.8505],
                    [174.7550, -36.8505],
                    [174.7550, -36.8488],
                    [174.7530, -36.8488],
                    [174.7530, -36.8505],
                ]],
            }),
        ),
        (
            "Paddock C",
            json!({
                "type": "Polygon",
                "coordinates": [[
                    [174.7510, -36.8520],
                    [174.7540, -36.8520],
                    [174.7540, -36.8509],
                    [174.7510, -36.8509],
                    [174.7510, -36.8520],
                ]],
            }),
        ),
    ];

    let mut tx = pool.begin().await?;
    db::farms::insert(&mut *tx, &farm).await?;
    for (name, geom) in polygons {
        let paddock = build_paddock(&farm.id, name, geom);
        db::paddocks::insert(&mut *tx, &paddock).await?;
    }
    tx.commit().await?;

    info!(farm_id = %farm.id, "demo farm seeded");
    Ok(())
}

fn build_paddock(farm_id: &str, name: &str, geom: Value) -> Paddock {
    let area_ha = polygon_area_hectares(&geom);
    Paddock {
        id: Uuid::new_v4().to_string(),
        farm_id: farm_id.to_string(),
        name: name.to_string(),
        geom_geojson: Json(geom),
        area_ha,
        created_at: time::now(),
    }
}
