//! Integration tests for the ingestion, weather and recommendation
//! services, run against an in-memory database.

use std::sync::Arc;

use chrono::Days;
use farmsight_common::ndvi::SyntheticNdviProvider;
use farmsight_common::{time, Error};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use farmsight_api::db;
use farmsight_api::models::{
    Farm, JobStatus, JobType, Paddock, PaddockObservation, QualityFlag, RecommendationType,
    WeatherDaily,
};
use farmsight_api::services::pipeline;
use farmsight_api::services::recommendation;
use farmsight_api::services::thresholds::ThresholdStore;
use farmsight_api::services::weather;
use farmsight_api::{workers, AppState};

async fn test_pool() -> SqlitePool {
    // One connection so every query sees the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();
    pool
}

async fn insert_farm(pool: &SqlitePool) -> Farm {
    let farm = Farm {
        id: Uuid::new_v4().to_string(),
        name: "Test Farm".to_string(),
        description: None,
        latitude: -36.85,
        longitude: 174.76,
        created_at: time::now(),
    };
    db::farms::insert(pool, &farm).await.unwrap();
    farm
}

async fn insert_paddock(pool: &SqlitePool, farm_id: &str, name: &str) -> Paddock {
    let paddock = Paddock {
        id: Uuid::new_v4().to_string(),
        farm_id: farm_id.to_string(),
        name: name.to_string(),
        geom_geojson: Json(json!({
            "type": "Polygon",
            "coordinates": [[
                [174.75, -36.85],
                [174.76, -36.85],
                [174.76, -36.84],
                [174.75, -36.84],
                [174.75, -36.85],
            ]],
        })),
        area_ha: 10.0,
        created_at: time::now(),
    };
    db::paddocks::insert(pool, &paddock).await.unwrap();
    paddock
}

async fn insert_observation(
    pool: &SqlitePool,
    paddock_id: &str,
    days_ago: u64,
    ndvi_mean: f64,
    cloud_pct: f64,
) {
    let obs = PaddockObservation {
        id: Uuid::new_v4().to_string(),
        paddock_id: paddock_id.to_string(),
        obs_date: time::today().checked_sub_days(Days::new(days_ago)).unwrap(),
        ndvi_mean,
        ndvi_p10: None,
        ndvi_p50: None,
        ndvi_p90: None,
        cloud_pct: Some(cloud_pct),
        quality_flag: QualityFlag::Ok,
        created_at: time::now(),
    };
    db::observations::upsert(pool, &obs).await.unwrap();
}

async fn insert_weather_day(pool: &SqlitePool, farm_id: &str, days_ahead: u64, rain_mm: f64) {
    let day = WeatherDaily {
        id: Uuid::new_v4().to_string(),
        farm_id: farm_id.to_string(),
        date: time::today() + Days::new(days_ahead),
        rain_mm,
        temp_min_c: 5.0,
        temp_max_c: 18.0,
        wind_kph: 14.0,
        source: "synthetic".to_string(),
        fetched_at: time::now(),
    };
    db::weather::insert(pool, &day).await.unwrap();
}

#[tokio::test]
async fn test_ingestion_creates_three_scenes_and_observations() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    let paddock_a = insert_paddock(&pool, &farm.id, "North").await;
    insert_paddock(&pool, &farm.id, "South").await;

    let scenes = pipeline::ingest_satellite_scenes(&pool, &thresholds, &SyntheticNdviProvider, &farm.id)
        .await
        .unwrap();

    assert_eq!(scenes.len(), 3);
    let today = time::today();
    for (scene, offset) in scenes.iter().zip([3u64, 10, 17]) {
        assert_eq!(scene.scene_date, today.checked_sub_days(Days::new(offset)).unwrap());
        assert_eq!(scene.source, "stac_sentinel2");
        assert_eq!(scene.cloud_pct, Some(((offset * 7) % 65) as f64));
        assert!(scene.red_uri.as_deref().unwrap().starts_with("s3://synthetic/red/"));
    }

    // Two paddocks, three dates each
    let series = db::observations::series_for_paddock(&pool, &paddock_a.id)
        .await
        .unwrap();
    assert_eq!(series.len(), 3);
    for obs in &series {
        assert!(obs.ndvi_mean >= 0.12 && obs.ndvi_mean <= 0.80);
    }

    // Offset 17 has cloud 54 which crosses the default 40 threshold
    let cloudy = series
        .iter()
        .find(|obs| obs.obs_date == today.checked_sub_days(Days::new(17)).unwrap())
        .unwrap();
    assert_eq!(cloudy.quality_flag, QualityFlag::Cloudy);
    let clear = series
        .iter()
        .find(|obs| obs.obs_date == today.checked_sub_days(Days::new(3)).unwrap())
        .unwrap();
    assert_eq!(clear.quality_flag, QualityFlag::Ok);
}

#[tokio::test]
async fn test_ingestion_is_idempotent() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    let paddock = insert_paddock(&pool, &farm.id, "Only").await;

    let first = pipeline::ingest_satellite_scenes(&pool, &thresholds, &SyntheticNdviProvider, &farm.id)
        .await
        .unwrap();
    let before = db::observations::series_for_paddock(&pool, &paddock.id)
        .await
        .unwrap();
    assert_eq!(before.len(), 3);

    let second = pipeline::ingest_satellite_scenes(&pool, &thresholds, &SyntheticNdviProvider, &farm.id)
        .await
        .unwrap();

    // Scenes are reused, not duplicated
    let first_ids: Vec<&str> = first.iter().map(|s| s.id.as_str()).collect();
    let second_ids: Vec<&str> = second.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(first_ids, second_ids);

    // Observations updated in place, row ids preserved
    let after = db::observations::series_for_paddock(&pool, &paddock.id)
        .await
        .unwrap();
    assert_eq!(after.len(), 3);
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.ndvi_mean, b.ndvi_mean);
    }
}

#[tokio::test]
async fn test_aggregation_missing_scene_records_failed_run() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());

    let result =
        pipeline::aggregate_paddock_ndvi(&pool, &thresholds, &SyntheticNdviProvider, "no-such-scene")
            .await;
    assert!(result.is_ok());

    let runs = db::job_runs::list(&pool, None, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].job_type, JobType::AggregateNdvi);
    assert_eq!(runs[0].status, JobStatus::Failed);
    assert_eq!(runs[0].error.as_deref(), Some("Scene not found"));
    assert!(runs[0].finished_at.is_some());
}

#[tokio::test]
async fn test_ingestion_records_job_runs() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    insert_paddock(&pool, &farm.id, "Only").await;

    pipeline::ingest_satellite_scenes(&pool, &thresholds, &SyntheticNdviProvider, &farm.id)
        .await
        .unwrap();

    let runs = db::job_runs::list(&pool, None, 50).await.unwrap();
    let ingest: Vec<_> = runs
        .iter()
        .filter(|run| run.job_type == JobType::IngestSatellite)
        .collect();
    let aggregate: Vec<_> = runs
        .iter()
        .filter(|run| run.job_type == JobType::AggregateNdvi)
        .collect();
    assert_eq!(ingest.len(), 1);
    assert_eq!(ingest[0].status, JobStatus::Success);
    assert_eq!(ingest[0].stats_json.0, json!({ "scenes": 3 }));
    assert_eq!(aggregate.len(), 3);
    assert!(aggregate.iter().all(|run| run.status == JobStatus::Success));
}

#[tokio::test]
async fn test_threshold_seeding_is_idempotent() {
    let pool = test_pool().await;
    let store = ThresholdStore::new(pool.clone());

    store.seed_defaults().await.unwrap();
    store.seed_defaults().await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM config_thresholds")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 6);
    assert_eq!(store.get("ndvi_good_threshold", 0.0).await.unwrap(), 0.50);
    assert_eq!(store.get("ndvi_drop_threshold", 0.0).await.unwrap(), -0.003);
}

#[tokio::test]
async fn test_threshold_fallback_for_missing_and_malformed() {
    let pool = test_pool().await;
    let store = ThresholdStore::new(pool.clone());

    assert_eq!(store.get("nonexistent_key", 1.5).await.unwrap(), 1.5);

    sqlx::query("INSERT INTO config_thresholds (key, value, updated_at) VALUES (?, ?, ?)")
        .bind("broken_key")
        .bind(Json(json!({ "value": "not a number" })))
        .bind(time::now())
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(store.get("broken_key", 2.5).await.unwrap(), 2.5);
}

#[tokio::test]
async fn test_recommendation_stale_observation_is_low_data() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    let paddock = insert_paddock(&pool, &farm.id, "Stale").await;
    // Good NDVI but 20 days old, past the 14-day default
    insert_observation(&pool, &paddock.id, 20, 0.65, 5.0).await;
    insert_weather_day(&pool, &farm.id, 0, 1.0).await;

    let rec = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    let children = db::recommendations::children(&pool, &rec.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].rec_type, RecommendationType::LowData);
    assert!(rec.summary_md.contains("Low confidence data"));
}

#[tokio::test]
async fn test_recommendation_cloudy_observation_is_low_data() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    let paddock = insert_paddock(&pool, &farm.id, "Cloudy").await;
    // Fresh and healthy, but cloud cover crosses the 40% default
    insert_observation(&pool, &paddock.id, 2, 0.65, 45.0).await;
    insert_weather_day(&pool, &farm.id, 0, 1.0).await;

    let rec = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    let children = db::recommendations::children(&pool, &rec.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].rec_type, RecommendationType::LowData);
}

#[tokio::test]
async fn test_recommendation_heavy_rain_beats_good_ndvi() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    let paddock = insert_paddock(&pool, &farm.id, "Wet").await;
    insert_observation(&pool, &paddock.id, 2, 0.70, 5.0).await;
    insert_weather_day(&pool, &farm.id, 0, 15.0).await;
    insert_weather_day(&pool, &farm.id, 1, 20.0).await;
    insert_weather_day(&pool, &farm.id, 2, 10.0).await;

    let rec = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    let children = db::recommendations::children(&pool, &rec.id).await.unwrap();
    assert_eq!(children[0].rec_type, RecommendationType::AvoidWaterlog);
}

#[tokio::test]
async fn test_recommendation_graze_now_window() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    let paddock = insert_paddock(&pool, &farm.id, "Ready").await;
    // Rising NDVI, fresh, light rain
    insert_observation(&pool, &paddock.id, 10, 0.55, 5.0).await;
    insert_observation(&pool, &paddock.id, 2, 0.62, 5.0).await;
    insert_weather_day(&pool, &farm.id, 0, 2.0).await;
    insert_weather_day(&pool, &farm.id, 1, 3.0).await;

    let rec = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    let children = db::recommendations::children(&pool, &rec.id).await.unwrap();
    assert_eq!(children[0].rec_type, RecommendationType::GrazeNow);
    assert!(children[0].message.contains("Good grazing window"));
}

#[tokio::test]
async fn test_recommendation_declining_trend_is_monitor_stress() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    let paddock = insert_paddock(&pool, &farm.id, "Declining").await;
    // 0.65 to 0.55 over 8 days, slope -0.0125 per day
    insert_observation(&pool, &paddock.id, 10, 0.65, 5.0).await;
    insert_observation(&pool, &paddock.id, 2, 0.55, 5.0).await;
    insert_weather_day(&pool, &farm.id, 0, 2.0).await;

    let rec = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    let children = db::recommendations::children(&pool, &rec.id).await.unwrap();
    assert_eq!(children[0].rec_type, RecommendationType::MonitorStress);
}

#[tokio::test]
async fn test_recommendation_mediocre_ndvi_falls_back_to_monitor_stress() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    let paddock = insert_paddock(&pool, &farm.id, "Middling").await;
    // Improving but below the 0.50 graze threshold, light rain
    insert_observation(&pool, &paddock.id, 10, 0.40, 5.0).await;
    insert_observation(&pool, &paddock.id, 2, 0.45, 5.0).await;
    insert_weather_day(&pool, &farm.id, 0, 2.0).await;

    let rec = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    let children = db::recommendations::children(&pool, &rec.id).await.unwrap();
    assert_eq!(children[0].rec_type, RecommendationType::MonitorStress);
}

#[tokio::test]
async fn test_recommendation_no_observations_is_low_data() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    insert_paddock(&pool, &farm.id, "Empty").await;

    let rec = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    let children = db::recommendations::children(&pool, &rec.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].rec_type, RecommendationType::LowData);
}

#[tokio::test]
async fn test_recommendation_week_regeneration_replaces() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;
    insert_paddock(&pool, &farm.id, "A").await;
    insert_paddock(&pool, &farm.id, "B").await;

    let first = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    let second = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.created_for_week_start, second.created_for_week_start);

    // Old shell and children are gone
    let old_children = db::recommendations::children(&pool, &first.id).await.unwrap();
    assert!(old_children.is_empty());
    let new_children = db::recommendations::children(&pool, &second.id).await.unwrap();
    assert_eq!(new_children.len(), 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recommendations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_recommendation_week_start_defaults_to_monday() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());
    let farm = insert_farm(&pool).await;

    let rec = recommendation::generate_weekly_recommendations(&pool, &thresholds, &farm.id, None)
        .await
        .unwrap();
    assert_eq!(rec.created_for_week_start, time::week_start_of(time::today()));
    assert_eq!(rec.summary_md, "- No actionable recommendations this week.");
}

#[tokio::test]
async fn test_recommendation_unknown_farm_commits_nothing() {
    let pool = test_pool().await;
    let thresholds = ThresholdStore::new(pool.clone());

    let result =
        recommendation::generate_weekly_recommendations(&pool, &thresholds, "no-such-farm", None)
            .await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recommendations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_weather_fetch_replaces_stored_forecast() {
    let pool = test_pool().await;
    let farm = insert_farm(&pool).await;

    let first = weather::fetch_weather_forecast(&pool, None, &farm.id)
        .await
        .unwrap();
    assert_eq!(first.len(), 7);
    assert_eq!(first[0].source, "synthetic");
    assert_eq!(first[3].rain_mm, 42.0);

    let second = weather::fetch_weather_forecast(&pool, None, &farm.id)
        .await
        .unwrap();
    assert_eq!(second.len(), 7);

    // Replaced wholesale, never accumulated
    let stored = db::weather::list_for_farm(&pool, &farm.id).await.unwrap();
    assert_eq!(stored.len(), 7);
}

#[tokio::test]
async fn test_weather_fetch_unknown_farm_is_empty() {
    let pool = test_pool().await;
    let rows = weather::fetch_weather_forecast(&pool, None, "no-such-farm")
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_generate_for_all_farms_records_job_runs() {
    let pool = test_pool().await;
    let farm_a = insert_farm(&pool).await;
    let farm_b = insert_farm(&pool).await;
    insert_paddock(&pool, &farm_a.id, "A1").await;
    let state = AppState::new(pool.clone(), Arc::new(SyntheticNdviProvider), None);

    let visited = workers::generate_for_all_farms(&state).await.unwrap();
    assert_eq!(visited, 2);

    let runs = db::job_runs::list(&pool, None, 10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs
        .iter()
        .all(|run| run.job_type == JobType::GenerateRecommendations
            && run.status == JobStatus::Success));
    assert!(db::recommendations::latest_for_farm(&pool, &farm_b.id)
        .await
        .unwrap()
        .is_some());
}
