//! Named numeric decision thresholds
//!
//! Thresholds are stored as JSON `{"value": n}` rows and read fresh on
//! every call. A missing or malformed row falls back to the
//! caller-supplied default, so a bad threshold never aborts the
//! pipeline. The store is passed into components explicitly rather
//! than accessed as global state.

use farmsight_common::{time, Result};
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::SqlitePool;

/// Default value for every known threshold key
pub const DEFAULT_THRESHOLDS: [(&str, f64); 6] = [
    ("ndvi_good_threshold", 0.50),
    ("rain_light_threshold", 10.0),
    ("rain_heavy_threshold", 40.0),
    ("ndvi_drop_threshold", -0.003),
    ("max_obs_age_days", 14.0),
    ("cloud_pct_high_threshold", 40.0),
];

/// Injected handle for threshold access
#[derive(Clone)]
pub struct ThresholdStore {
    pool: SqlitePool,
}

impl ThresholdStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert each default only if its key is absent. Safe to call on
    /// every startup.
    pub async fn seed_defaults(&self) -> Result<()> {
        for (key, value) in DEFAULT_THRESHOLDS {
            sqlx::query(
                "INSERT INTO config_thresholds (key, value, updated_at) VALUES (?, ?, ?) \
                 ON CONFLICT(key) DO NOTHING",
            )
            .bind(key)
            .bind(Json(json!({ "value": value })))
            .bind(time::now())
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Stored numeric value for `key`, or `fallback` when the key is
    /// missing or its value field is not numeric.
    pub async fn get(&self, key: &str, fallback: f64) -> Result<f64> {
        let stored: Option<Json<Value>> =
            sqlx::query_scalar("SELECT value FROM config_thresholds WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        let value = stored
            .and_then(|row| row.0.get("value").and_then(Value::as_f64))
            .unwrap_or(fallback);
        Ok(value)
    }
}
