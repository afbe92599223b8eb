//! Observation read endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use farmsight_common::ndvi::{ndvi_bucket, trend_direction, trend_slope};
use farmsight_common::Error;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{farms::require_farm, ApiResult};
use crate::db;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ObservationQuery {
    pub date: NaiveDate,
}

/// GET /api/v1/farms/:farm_id/observations/dates
pub async fn dates(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_farm(&state, &farm_id).await?;
    let dates = db::observations::distinct_dates_for_farm(&state.db, &farm_id).await?;
    Ok(Json(json!({ "data": { "dates": dates } })))
}

/// GET /api/v1/farms/:farm_id/observations?date=YYYY-MM-DD
pub async fn by_date(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
    Query(query): Query<ObservationQuery>,
) -> ApiResult<Json<Value>> {
    require_farm(&state, &farm_id).await?;
    let rows = db::observations::for_farm_on_date(&state.db, &farm_id, query.date).await?;
    let data: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "paddock_id": row.paddock_id,
                "paddock_name": row.paddock_name,
                "ndvi_mean": row.ndvi_mean,
                "bucket": ndvi_bucket(row.ndvi_mean),
                "quality_flag": row.quality_flag,
                "cloud_pct": row.cloud_pct,
            })
        })
        .collect();
    Ok(Json(json!({ "data": data, "meta": { "count": data.len() } })))
}

/// GET /api/v1/paddocks/:paddock_id/observations
///
/// Full time series plus a trend over the last three points.
pub async fn series(
    State(state): State<AppState>,
    Path(paddock_id): Path<String>,
) -> ApiResult<Json<Value>> {
    db::paddocks::get(&state.db, &paddock_id)
        .await?
        .ok_or_else(|| Error::NotFound("Paddock not found".to_string()))?;

    let observations = db::observations::series_for_paddock(&state.db, &paddock_id).await?;

    let points: Vec<Value> = observations
        .iter()
        .map(|obs| {
            json!({
                "obs_date": obs.obs_date,
                "ndvi_mean": obs.ndvi_mean,
                "ndvi_p10": obs.ndvi_p10,
                "ndvi_p50": obs.ndvi_p50,
                "ndvi_p90": obs.ndvi_p90,
                "cloud_pct": obs.cloud_pct,
                "quality_flag": obs.quality_flag,
            })
        })
        .collect();

    let tail = observations.len().saturating_sub(3);
    let trend_points: Vec<(NaiveDate, f64)> = observations[tail..]
        .iter()
        .map(|obs| (obs.obs_date, obs.ndvi_mean))
        .collect();
    let slope = trend_slope(&trend_points);

    Ok(Json(json!({
        "data": {
            "paddock_id": paddock_id,
            "points": points,
            "slope": slope,
            "direction": trend_direction(slope),
        }
    })))
}
