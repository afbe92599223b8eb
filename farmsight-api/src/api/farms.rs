//! Farm CRUD endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use farmsight_common::{time, Error};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{ApiError, ApiResult};
use crate::db;
use crate::models::Farm;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FarmCreate {
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct FarmUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// GET /api/v1/farms
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let farms = db::farms::list(&state.db).await?;
    Ok(Json(json!({ "data": farms, "meta": { "count": farms.len() } })))
}

/// POST /api/v1/farms
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<FarmCreate>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let farm = Farm {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        description: payload.description,
        latitude: payload.latitude,
        longitude: payload.longitude,
        created_at: time::now(),
    };
    db::farms::insert(&state.db, &farm).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": farm }))))
}

/// GET /api/v1/farms/:farm_id
pub async fn get(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let farm = require_farm(&state, &farm_id).await?;
    Ok(Json(json!({ "data": farm })))
}

/// PATCH /api/v1/farms/:farm_id
pub async fn update(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
    Json(payload): Json<FarmUpdate>,
) -> ApiResult<Json<Value>> {
    let mut farm = require_farm(&state, &farm_id).await?;
    if let Some(name) = payload.name {
        farm.name = name;
    }
    if let Some(description) = payload.description {
        farm.description = Some(description);
    }
    if let Some(latitude) = payload.latitude {
        farm.latitude = latitude;
    }
    if let Some(longitude) = payload.longitude {
        farm.longitude = longitude;
    }
    db::farms::update(&state.db, &farm).await?;
    Ok(Json(json!({ "data": farm })))
}

/// DELETE /api/v1/farms/:farm_id
pub async fn delete(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> ApiResult<StatusCode> {
    require_farm(&state, &farm_id).await?;
    let mut tx = state.db.begin().await.map_err(Error::from)?;
    db::farms::delete_cascade(&mut tx, &farm_id).await?;
    tx.commit().await.map_err(Error::from)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn require_farm(state: &AppState, farm_id: &str) -> Result<Farm, ApiError> {
    Ok(db::farms::get(&state.db, farm_id)
        .await?
        .ok_or_else(|| Error::NotFound("Farm not found".to_string()))?)
}
