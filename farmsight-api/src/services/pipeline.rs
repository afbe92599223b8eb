//! Satellite ingestion and observation aggregation
//!
//! Both operations are bracketed by a job run: a running record is
//! committed before any work happens and exactly one terminal update
//! follows, on success and on failure alike. Failures are recorded
//! into the run and then propagated; the run is an audit log, not a
//! substitute for error propagation.

use chrono::Days;
use farmsight_common::{time, Error, NdviProvider, Result};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::models::{JobStatus, JobType, PaddockObservation, QualityFlag, SatelliteScene};
use crate::services::thresholds::ThresholdStore;

/// Fixed imagery source identifier for synthetic scenes
pub const SCENE_SOURCE: &str = "stac_sentinel2";

/// Lookback offsets (days before today) for scene discovery
const SCENE_LOOKBACK_OFFSETS: [u64; 3] = [3, 10, 17];

/// Discover or create imagery records for a farm, then aggregate
/// observations for each one.
///
/// Idempotent on (farm, scene_date, source): re-running on the same
/// day reuses existing scenes and re-aggregates them in place.
pub async fn ingest_satellite_scenes(
    pool: &SqlitePool,
    thresholds: &ThresholdStore,
    ndvi: &dyn NdviProvider,
    farm_id: &str,
) -> Result<Vec<SatelliteScene>> {
    let run = db::job_runs::start(pool, JobType::IngestSatellite, Some(farm_id)).await?;
    match ingest_scenes_inner(pool, thresholds, ndvi, farm_id).await {
        Ok(scenes) => {
            db::job_runs::finish(
                pool,
                &run.id,
                JobStatus::Success,
                json!({ "scenes": scenes.len() }),
                None,
            )
            .await?;
            info!(farm_id, scenes = scenes.len(), "satellite ingestion finished");
            Ok(scenes)
        }
        Err(err) => {
            db::job_runs::finish(
                pool,
                &run.id,
                JobStatus::Failed,
                json!({ "scenes": 0 }),
                Some(err.to_string()),
            )
            .await?;
            Err(err)
        }
    }
}

async fn ingest_scenes_inner(
    pool: &SqlitePool,
    thresholds: &ThresholdStore,
    ndvi: &dyn NdviProvider,
    farm_id: &str,
) -> Result<Vec<SatelliteScene>> {
    let today = time::today();
    let mut scenes = Vec::with_capacity(SCENE_LOOKBACK_OFFSETS.len());

    let mut tx = pool.begin().await?;
    for offset in SCENE_LOOKBACK_OFFSETS {
        let scene_date = today
            .checked_sub_days(Days::new(offset))
            .ok_or_else(|| Error::Internal("scene date out of range".to_string()))?;

        if let Some(existing) =
            db::scenes::find_by_key(&mut *tx, farm_id, scene_date, SCENE_SOURCE).await?
        {
            scenes.push(existing);
            continue;
        }

        let scene = SatelliteScene {
            id: Uuid::new_v4().to_string(),
            farm_id: farm_id.to_string(),
            source: SCENE_SOURCE.to_string(),
            scene_date,
            cloud_pct: Some(((offset * 7) % 65) as f64),
            red_uri: Some(format!("s3://synthetic/red/{farm_id}/{scene_date}.tif")),
            nir_uri: Some(format!("s3://synthetic/nir/{farm_id}/{scene_date}.tif")),
            mask_uri: Some(format!("s3://synthetic/mask/{farm_id}/{scene_date}.tif")),
            created_at: time::now(),
        };
        db::scenes::insert(&mut *tx, &scene).await?;
        scenes.push(scene);
    }
    tx.commit().await?;

    // Aggregation is idempotent, so reused scenes are re-aggregated too
    for scene in &scenes {
        aggregate_paddock_ndvi(pool, thresholds, ndvi, &scene.id).await?;
    }

    Ok(scenes)
}

/// Fan one scene out into per-paddock observations.
///
/// A missing scene is recorded as a failed run but not raised; the
/// caller already holds the scene reference in the normal path.
pub async fn aggregate_paddock_ndvi(
    pool: &SqlitePool,
    thresholds: &ThresholdStore,
    ndvi: &dyn NdviProvider,
    scene_id: &str,
) -> Result<()> {
    let run = db::job_runs::start(pool, JobType::AggregateNdvi, None).await?;

    let scene = match db::scenes::get(pool, scene_id).await {
        Ok(Some(scene)) => scene,
        Ok(None) => {
            warn!(scene_id, "scene not found; aggregation skipped");
            db::job_runs::finish(
                pool,
                &run.id,
                JobStatus::Failed,
                json!({}),
                Some("Scene not found".to_string()),
            )
            .await?;
            return Ok(());
        }
        Err(err) => {
            db::job_runs::finish(pool, &run.id, JobStatus::Failed, json!({}), Some(err.to_string()))
                .await?;
            return Err(err);
        }
    };

    match aggregate_inner(pool, thresholds, ndvi, &scene).await {
        Ok(paddocks) => {
            db::job_runs::finish(
                pool,
                &run.id,
                JobStatus::Success,
                json!({ "paddocks": paddocks }),
                None,
            )
            .await?;
            Ok(())
        }
        Err(err) => {
            db::job_runs::finish(pool, &run.id, JobStatus::Failed, json!({}), Some(err.to_string()))
                .await?;
            Err(err)
        }
    }
}

async fn aggregate_inner(
    pool: &SqlitePool,
    thresholds: &ThresholdStore,
    ndvi: &dyn NdviProvider,
    scene: &SatelliteScene,
) -> Result<usize> {
    let paddocks = db::paddocks::list_for_farm(pool, &scene.farm_id).await?;
    let cloud_high = thresholds.get("cloud_pct_high_threshold", 40.0).await?;

    let mut tx = pool.begin().await?;
    for paddock in &paddocks {
        let value = ndvi.compute(scene.scene_date, &paddock.id);
        let quality = if scene.cloud_pct.unwrap_or(0.0) >= cloud_high {
            QualityFlag::Cloudy
        } else {
            QualityFlag::Ok
        };

        let obs = PaddockObservation {
            id: Uuid::new_v4().to_string(),
            paddock_id: paddock.id.clone(),
            obs_date: scene.scene_date,
            ndvi_mean: value,
            ndvi_p10: Some((value - 0.12).max(0.0)),
            ndvi_p50: Some(value),
            ndvi_p90: Some((value + 0.12).min(1.0)),
            cloud_pct: scene.cloud_pct,
            quality_flag: quality,
            created_at: time::now(),
        };
        db::observations::upsert(&mut *tx, &obs).await?;
    }
    tx.commit().await?;

    Ok(paddocks.len())
}
