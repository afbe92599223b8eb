//! Recommendation endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use farmsight_common::Error;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::api::{ApiError, ApiResult};
use crate::db;
use crate::models::Recommendation;
use crate::services::recommendation;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub week_start: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub week_start: Option<NaiveDate>,
}

/// GET /api/v1/farms/:farm_id/recommendations/latest
pub async fn latest(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let rec = recommendation::get_latest_recommendation(&state.db, &farm_id)
        .await?
        .ok_or_else(|| Error::NotFound("No recommendations available".to_string()))?;
    let data = serialize_recommendation(&state.db, &rec).await?;
    Ok(Json(json!({ "data": data })))
}

/// GET /api/v1/farms/:farm_id/recommendations?week_start=YYYY-MM-DD
pub async fn by_week(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
    Query(query): Query<WeekQuery>,
) -> ApiResult<Json<Value>> {
    let rec = recommendation::get_recommendation_for_week(&state.db, &farm_id, query.week_start)
        .await?
        .ok_or_else(|| Error::NotFound("Recommendation not found".to_string()))?;
    let data = serialize_recommendation(&state.db, &rec).await?;
    Ok(Json(json!({ "data": data })))
}

/// POST /api/v1/farms/:farm_id/recommendations/generate
pub async fn generate(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
    Json(payload): Json<GenerateRequest>,
) -> ApiResult<Json<Value>> {
    let rec = recommendation::generate_weekly_recommendations(
        &state.db,
        &state.thresholds,
        &farm_id,
        payload.week_start,
    )
    .await?;
    let data = serialize_recommendation(&state.db, &rec).await?;
    Ok(Json(json!({ "data": data })))
}

async fn serialize_recommendation(
    pool: &SqlitePool,
    rec: &Recommendation,
) -> Result<Value, ApiError> {
    let children = db::recommendations::children(pool, &rec.id).await?;
    let rows: Vec<Value> = children
        .iter()
        .map(|row| {
            json!({
                "paddock_id": row.paddock_id,
                "rec_type": row.rec_type,
                "message": row.message,
                "severity": row.severity,
            })
        })
        .collect();
    Ok(json!({
        "id": rec.id,
        "farm_id": rec.farm_id,
        "created_for_week_start": rec.created_for_week_start,
        "summary_md": rec.summary_md,
        "created_at": rec.created_at,
        "paddock_recommendations": rows,
    }))
}
