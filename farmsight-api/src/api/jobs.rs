//! Job trigger and run history endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{farms::require_farm, ApiResult};
use crate::db;
use crate::models::{JobStatus, JobType};
use crate::services::{pipeline, recommendation, weather};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct JobRunQuery {
    #[serde(default)]
    pub farm_id: Option<String>,
}

/// POST /api/v1/farms/:farm_id/jobs/ingest
///
/// Runs the full pipeline for one farm: scene ingestion, weather
/// fetch, recommendation generation.
pub async fn run_ingest_pipeline(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_farm(&state, &farm_id).await?;

    let scenes = pipeline::ingest_satellite_scenes(
        &state.db,
        &state.thresholds,
        state.ndvi.as_ref(),
        &farm_id,
    )
    .await?;
    let forecast =
        weather::fetch_weather_forecast(&state.db, state.weather.as_deref(), &farm_id).await?;

    // Bracketed the same way the periodic worker brackets its passes
    let run =
        db::job_runs::start(&state.db, JobType::GenerateRecommendations, Some(farm_id.as_str()))
            .await?;
    let rec = match recommendation::generate_weekly_recommendations(
        &state.db,
        &state.thresholds,
        &farm_id,
        None,
    )
    .await
    {
        Ok(rec) => {
            db::job_runs::finish(
                &state.db,
                &run.id,
                JobStatus::Success,
                json!({ "recommendation_id": rec.id }),
                None,
            )
            .await?;
            rec
        }
        Err(err) => {
            db::job_runs::finish(
                &state.db,
                &run.id,
                JobStatus::Failed,
                json!({}),
                Some(err.to_string()),
            )
            .await?;
            return Err(err.into());
        }
    };

    Ok(Json(json!({
        "data": {
            "farm_id": farm_id,
            "scenes_processed": scenes.len(),
            "weather_days": forecast.len(),
            "recommendation_id": rec.id,
        }
    })))
}

/// GET /api/v1/jobs/runs?farm_id=...
pub async fn runs(
    State(state): State<AppState>,
    Query(query): Query<JobRunQuery>,
) -> ApiResult<Json<Value>> {
    let rows = db::job_runs::list(&state.db, query.farm_id.as_deref(), 200).await?;
    Ok(Json(json!({ "data": rows, "meta": { "count": rows.len() } })))
}
