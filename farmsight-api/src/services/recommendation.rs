//! Weekly recommendation engine
//!
//! One recommendation per farm per week. Regenerating a week deletes
//! the previous record and its per-paddock rows before inserting the
//! new set; all writes happen in a single transaction so a failed
//! generation never leaves a partial week behind.

use chrono::NaiveDate;
use farmsight_common::ndvi::trend_slope;
use farmsight_common::{time, Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::models::{PaddockRecommendation, Recommendation, RecommendationType, Severity};
use crate::services::thresholds::ThresholdStore;

#[derive(Debug, Default)]
struct RecCounts {
    graze_now: usize,
    avoid_waterlog: usize,
    monitor_stress: usize,
    low_data: usize,
}

impl RecCounts {
    fn bump(&mut self, rec_type: RecommendationType) {
        match rec_type {
            RecommendationType::GrazeNow => self.graze_now += 1,
            RecommendationType::AvoidWaterlog => self.avoid_waterlog += 1,
            RecommendationType::MonitorStress => self.monitor_stress += 1,
            RecommendationType::LowData => self.low_data += 1,
        }
    }
}

/// Generate the recommendation set for (farm, week), replacing any
/// existing one. `week_start` defaults to the Monday of the current
/// week. Unknown farms fail the whole operation with nothing
/// committed.
pub async fn generate_weekly_recommendations(
    pool: &SqlitePool,
    thresholds: &ThresholdStore,
    farm_id: &str,
    week_start: Option<NaiveDate>,
) -> Result<Recommendation> {
    db::farms::get(pool, farm_id)
        .await?
        .ok_or_else(|| Error::NotFound("Farm not found".to_string()))?;

    let week_start = week_start.unwrap_or_else(|| time::week_start_of(time::today()));

    let paddocks = db::paddocks::list_for_farm(pool, farm_id).await?;
    let forecast = db::weather::first_days(pool, farm_id, 3).await?;
    let rain_3day: f64 = forecast.iter().map(|day| day.rain_mm).sum();

    let ndvi_good = thresholds.get("ndvi_good_threshold", 0.50).await?;
    let rain_light = thresholds.get("rain_light_threshold", 10.0).await?;
    let rain_heavy = thresholds.get("rain_heavy_threshold", 40.0).await?;
    let ndvi_drop = thresholds.get("ndvi_drop_threshold", -0.003).await?;
    let max_obs_age_days = thresholds.get("max_obs_age_days", 14.0).await?;
    let cloud_high = thresholds.get("cloud_pct_high_threshold", 40.0).await?;

    let today = time::today();
    let recommendation_id = Uuid::new_v4().to_string();
    let mut rows: Vec<PaddockRecommendation> = Vec::with_capacity(paddocks.len());
    let mut counts = RecCounts::default();

    for paddock in &paddocks {
        let obs = db::observations::recent_for_paddock(pool, &paddock.id, 3).await?;

        let rec_type = if obs.is_empty() {
            RecommendationType::LowData
        } else {
            let latest = &obs[0];
            let mut points: Vec<(NaiveDate, f64)> =
                obs.iter().map(|o| (o.obs_date, o.ndvi_mean)).collect();
            points.reverse();
            let slope = trend_slope(&points);

            let age_days = (today - latest.obs_date).num_days();
            // First match wins; order carries the decision priority
            if age_days as f64 > max_obs_age_days
                || latest.cloud_pct.unwrap_or(0.0) >= cloud_high
            {
                RecommendationType::LowData
            } else if rain_3day >= rain_heavy {
                RecommendationType::AvoidWaterlog
            } else if slope.is_some_and(|s| s <= ndvi_drop) {
                RecommendationType::MonitorStress
            } else if latest.ndvi_mean >= ndvi_good && rain_3day <= rain_light {
                RecommendationType::GrazeNow
            } else {
                RecommendationType::MonitorStress
            }
        };

        counts.bump(rec_type);
        rows.push(build_row(&recommendation_id, &paddock.id, rec_type));
    }

    let rec = Recommendation {
        id: recommendation_id,
        farm_id: farm_id.to_string(),
        created_for_week_start: week_start,
        summary_md: summary_from_counts(&counts),
        created_at: time::now(),
    };

    let mut tx = pool.begin().await?;
    if let Some(existing) = db::recommendations::find_for_week(&mut *tx, farm_id, week_start).await? {
        db::recommendations::delete_with_children(&mut tx, &existing.id).await?;
    }
    db::recommendations::insert(&mut *tx, &rec).await?;
    for row in &rows {
        db::recommendations::insert_child(&mut *tx, row).await?;
    }
    tx.commit().await?;

    info!(
        farm_id,
        week_start = %week_start,
        paddocks = rows.len(),
        "weekly recommendations generated"
    );
    Ok(rec)
}

pub async fn get_latest_recommendation(
    pool: &SqlitePool,
    farm_id: &str,
) -> Result<Option<Recommendation>> {
    db::recommendations::latest_for_farm(pool, farm_id).await
}

pub async fn get_recommendation_for_week(
    pool: &SqlitePool,
    farm_id: &str,
    week_start: NaiveDate,
) -> Result<Option<Recommendation>> {
    db::recommendations::find_for_week(pool, farm_id, week_start).await
}

fn build_row(
    recommendation_id: &str,
    paddock_id: &str,
    rec_type: RecommendationType,
) -> PaddockRecommendation {
    let (message, severity) = template(rec_type);
    PaddockRecommendation {
        id: Uuid::new_v4().to_string(),
        recommendation_id: recommendation_id.to_string(),
        paddock_id: paddock_id.to_string(),
        rec_type,
        message: message.to_string(),
        severity,
        created_at: time::now(),
    }
}

fn template(rec_type: RecommendationType) -> (&'static str, Severity) {
    match rec_type {
        RecommendationType::GrazeNow => (
            "High pasture health and light rain forecast. Good grazing window next 2 days.",
            Severity::Info,
        ),
        RecommendationType::AvoidWaterlog => (
            "Heavy rain forecast in next 72h. Avoid grazing to reduce pugging.",
            Severity::Warning,
        ),
        RecommendationType::MonitorStress => (
            "NDVI trend down across last observations. Check for pests or irrigation needs.",
            Severity::Warning,
        ),
        RecommendationType::LowData => (
            "Recent imagery too cloudy or stale; limited confidence.",
            Severity::Warning,
        ),
    }
}

fn summary_from_counts(counts: &RecCounts) -> String {
    let mut lines = Vec::new();
    if counts.graze_now > 0 {
        lines.push(format!("- **{} paddocks ready to graze**", counts.graze_now));
    }
    if counts.avoid_waterlog > 0 {
        lines.push(format!(
            "- **Avoid waterlogging risk** in {} paddocks",
            counts.avoid_waterlog
        ));
    }
    if counts.monitor_stress > 0 {
        lines.push(format!("- **Monitor stress** in {} paddocks", counts.monitor_stress));
    }
    if counts.low_data > 0 {
        lines.push(format!("- **Low confidence data** for {} paddocks", counts.low_data));
    }
    if lines.is_empty() {
        "- No actionable recommendations this week.".to_string()
    } else {
        lines.join("\n")
    }
}
