//! Background workers
//!
//! The periodic worker regenerates the current week's recommendations
//! for every known farm once a day. Each farm pass is bracketed by a
//! `generate_recommendations` job run; one farm failing does not stop
//! the pass for the others.

use std::time::Duration;

use farmsight_common::Result;
use serde_json::json;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, warn};

use crate::db;
use crate::models::{JobStatus, JobType};
use crate::services::recommendation;
use crate::AppState;

const RECOMMENDATION_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

/// Run the daily recommendation pass forever. The first pass happens
/// one full interval after startup, not immediately.
pub async fn run_weekly_recommendation_loop(state: AppState) {
    let mut ticker = interval_at(Instant::now() + RECOMMENDATION_INTERVAL, RECOMMENDATION_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match generate_for_all_farms(&state).await {
            Ok(count) => tracing::info!(farms = count, "recommendation pass finished"),
            Err(err) => error!("recommendation pass failed: {err}"),
        }
    }
}

/// Generate weekly recommendations for every farm, recording a job
/// run per farm. Returns the number of farms visited.
pub async fn generate_for_all_farms(state: &AppState) -> Result<usize> {
    let farm_ids = db::farms::list_ids(&state.db).await?;
    for farm_id in &farm_ids {
        let run =
            db::job_runs::start(&state.db, JobType::GenerateRecommendations, Some(farm_id.as_str()))
                .await?;
        match recommendation::generate_weekly_recommendations(
            &state.db,
            &state.thresholds,
            farm_id,
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
            }
            Err(err) => {
                warn!(farm_id = %farm_id, "recommendation generation failed: {err}");
                db::job_runs::finish(
                    &state.db,
                    &run.id,
                    JobStatus::Failed,
                    json!({}),
                    Some(err.to_string()),
                )
                .await?;
            }
        }
    }
    Ok(farm_ids.len())
}
