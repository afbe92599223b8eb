//! Data model for the FarmSight service
//!
//! Row structs map 1:1 onto the SQLite tables created in [`crate::db`].
//! Enums are stored as their wire strings so the database stays
//! readable and the API serialization matches the stored value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Kind of tracked pipeline execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum JobType {
    IngestSatellite,
    ComputeNdvi,
    AggregateNdvi,
    FetchWeather,
    GenerateRecommendations,
    CleanupArtifacts,
}

/// Lifecycle state of a job run; terminal states are never mutated again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Success,
    Failed,
}

/// Reliability classification of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum QualityFlag {
    #[serde(rename = "OK")]
    #[sqlx(rename = "OK")]
    Ok,
    #[serde(rename = "CLOUDY")]
    #[sqlx(rename = "CLOUDY")]
    Cloudy,
    #[serde(rename = "NO_DATA")]
    #[sqlx(rename = "NO_DATA")]
    NoData,
}

/// Per-paddock recommendation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum RecommendationType {
    #[serde(rename = "GRAZE_NOW")]
    #[sqlx(rename = "GRAZE_NOW")]
    GrazeNow,
    #[serde(rename = "AVOID_WATERLOG")]
    #[sqlx(rename = "AVOID_WATERLOG")]
    AvoidWaterlog,
    #[serde(rename = "MONITOR_STRESS")]
    #[sqlx(rename = "MONITOR_STRESS")]
    MonitorStress,
    #[serde(rename = "LOW_DATA")]
    #[sqlx(rename = "LOW_DATA")]
    LowData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// Top-level owning entity for paddocks, imagery, weather and recommendations
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Farm {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

/// Bounded land area belonging to a farm; the unit of observation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Paddock {
    pub id: String,
    pub farm_id: String,
    pub name: String,
    pub geom_geojson: Json<serde_json::Value>,
    pub area_ha: f64,
    pub created_at: DateTime<Utc>,
}

/// One dated imagery-metadata record ("scene") for a farm.
/// Unique per (farm_id, scene_date, source).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SatelliteScene {
    pub id: String,
    pub farm_id: String,
    pub source: String,
    pub scene_date: NaiveDate,
    pub cloud_pct: Option<f64>,
    pub red_uri: Option<String>,
    pub nir_uri: Option<String>,
    pub mask_uri: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-paddock-per-date index observation; an upsert target keyed by
/// (paddock_id, obs_date), not an append-only log.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaddockObservation {
    pub id: String,
    pub paddock_id: String,
    pub obs_date: NaiveDate,
    pub ndvi_mean: f64,
    pub ndvi_p10: Option<f64>,
    pub ndvi_p50: Option<f64>,
    pub ndvi_p90: Option<f64>,
    pub cloud_pct: Option<f64>,
    pub quality_flag: QualityFlag,
    pub created_at: DateTime<Utc>,
}

/// Weekly recommendation shell, unique per (farm_id, week start).
/// Regeneration replaces the row and its children wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recommendation {
    pub id: String,
    pub farm_id: String,
    pub created_for_week_start: NaiveDate,
    pub summary_md: String,
    pub created_at: DateTime<Utc>,
}

/// Child row of [`Recommendation`], one per paddock
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaddockRecommendation {
    pub id: String,
    pub recommendation_id: String,
    pub paddock_id: String,
    pub rec_type: RecommendationType,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

/// One forecast day for a farm
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeatherDaily {
    pub id: String,
    pub farm_id: String,
    pub date: NaiveDate,
    pub rain_mm: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub wind_kph: f64,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

/// Audited record of one pipeline execution's lifecycle and outcome
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRun {
    pub id: String,
    pub job_type: JobType,
    pub farm_id: Option<String>,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stats_json: Json<serde_json::Value>,
    pub error: Option<String>,
}
