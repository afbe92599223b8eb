//! Paddock CRUD and geometry import endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use farmsight_common::geometry::polygon_area_hectares;
use farmsight_common::{time, Error};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::api::{farms::require_farm, ApiResult};
use crate::db;
use crate::models::Paddock;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PaddockCreate {
    pub name: String,
    pub geom_geojson: Value,
}

#[derive(Debug, Deserialize)]
pub struct PaddockUpdate {
    pub name: Option<String>,
    pub geom_geojson: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct PaddockImportRequest {
    pub feature_collection: Value,
}

/// GET /api/v1/farms/:farm_id/paddocks
pub async fn list(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_farm(&state, &farm_id).await?;
    let paddocks = db::paddocks::list_for_farm(&state.db, &farm_id).await?;
    Ok(Json(json!({ "data": paddocks, "meta": { "count": paddocks.len() } })))
}

/// POST /api/v1/farms/:farm_id/paddocks
pub async fn create(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
    Json(payload): Json<PaddockCreate>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require_farm(&state, &farm_id).await?;
    let paddock = build_paddock(&farm_id, payload.name, payload.geom_geojson)?;
    db::paddocks::insert(&state.db, &paddock).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": paddock }))))
}

/// PATCH /api/v1/paddocks/:paddock_id
pub async fn update(
    State(state): State<AppState>,
    Path(paddock_id): Path<String>,
    Json(payload): Json<PaddockUpdate>,
) -> ApiResult<Json<Value>> {
    let mut paddock = db::paddocks::get(&state.db, &paddock_id)
        .await?
        .ok_or_else(|| Error::NotFound("Paddock not found".to_string()))?;
    if let Some(geom) = payload.geom_geojson {
        paddock.area_ha = polygon_area_hectares(&geom);
        paddock.geom_geojson = SqlJson(geom);
    }
    if let Some(name) = payload.name {
        paddock.name = name;
    }
    db::paddocks::update(&state.db, &paddock).await?;
    Ok(Json(json!({ "data": paddock })))
}

/// DELETE /api/v1/paddocks/:paddock_id
pub async fn delete(
    State(state): State<AppState>,
    Path(paddock_id): Path<String>,
) -> ApiResult<StatusCode> {
    db::paddocks::get(&state.db, &paddock_id)
        .await?
        .ok_or_else(|| Error::NotFound("Paddock not found".to_string()))?;
    let mut tx = state.db.begin().await.map_err(Error::from)?;
    db::paddocks::delete_cascade(&mut tx, &paddock_id).await?;
    tx.commit().await.map_err(Error::from)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/farms/:farm_id/paddocks/import
///
/// Imports Polygon features from a GeoJSON FeatureCollection.
/// Per-item failures are reported alongside successes instead of
/// aborting the whole batch.
pub async fn import(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
    Json(payload): Json<PaddockImportRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require_farm(&state, &farm_id).await?;

    let fc = payload.feature_collection;
    if fc.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(Error::InvalidInput(
            "feature_collection must be a GeoJSON FeatureCollection".to_string(),
        )
        .into());
    }

    let features = fc
        .get("features")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut created: Vec<Paddock> = Vec::new();
    let mut failures: Vec<Value> = Vec::new();

    let mut tx = state.db.begin().await.map_err(Error::from)?;
    for (index, feature) in features.iter().enumerate() {
        match import_feature(&farm_id, index, feature) {
            Ok(paddock) => {
                db::paddocks::insert(&mut *tx, &paddock).await?;
                created.push(paddock);
            }
            Err(err) => failures.push(json!({ "index": index, "error": err.to_string() })),
        }
    }
    tx.commit().await.map_err(Error::from)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": created,
            "meta": { "count": created.len(), "failures": failures },
        })),
    ))
}

fn import_feature(farm_id: &str, index: usize, feature: &Value) -> Result<Paddock, Error> {
    let geom = feature.get("geometry").cloned().unwrap_or(json!({}));
    if geom.get("type").and_then(Value::as_str) != Some("Polygon") {
        return Err(Error::InvalidInput(
            "Feature geometry must be Polygon".to_string(),
        ));
    }
    let name = feature
        .get("properties")
        .and_then(|props| props.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Imported Paddock {}", index + 1));
    build_paddock(farm_id, name, geom)
}

fn build_paddock(farm_id: &str, name: String, geom: Value) -> Result<Paddock, Error> {
    let area_ha = polygon_area_hectares(&geom);
    Ok(Paddock {
        id: Uuid::new_v4().to_string(),
        farm_id: farm_id.to_string(),
        name,
        geom_geojson: SqlJson(geom),
        area_ha,
        created_at: time::now(),
    })
}
