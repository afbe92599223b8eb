//! Weather forecast fetching and storage
//!
//! With an OpenWeather API key configured, the 5-day/3-hour forecast
//! is collapsed into per-day buckets; without one, a deterministic
//! synthetic 7-day forecast stands in. Either way a successful fetch
//! fully replaces the stored forecast rows for the farm.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate};
use farmsight_common::{time, Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::models::WeatherDaily;

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);
const FORECAST_DAYS: usize = 7;

/// One fetched forecast day, before persistence
#[derive(Debug, Clone)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub rain_mm: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub wind_kph: f64,
    pub source: &'static str,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: EntryMain,
    wind: EntryWind,
    #[serde(default)]
    rain: Option<EntryRain>,
}

#[derive(Debug, Deserialize)]
struct EntryMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct EntryWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct EntryRain {
    #[serde(rename = "3h", default)]
    three_hour: f64,
}

/// OpenWeather forecast client. Transport failures propagate as hard
/// errors; there is no retry here.
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetch and collapse the 3-hour forecast into up to 7 day buckets
    pub async fn fetch_daily(&self, latitude: f64, longitude: f64) -> Result<Vec<ForecastDay>> {
        let url = format!("{}/forecast", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|err| Error::Upstream(format!("Weather request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("Weather API returned {status}")));
        }

        let payload: ForecastResponse = response
            .json()
            .await
            .map_err(|err| Error::Upstream(format!("Weather response parse failed: {err}")))?;

        let mut buckets: BTreeMap<NaiveDate, ForecastDay> = BTreeMap::new();
        for entry in payload.list {
            let Some(timestamp) = DateTime::from_timestamp(entry.dt, 0) else {
                continue;
            };
            let day = timestamp.date_naive();
            let wind_kph = entry.wind.speed * 3.6;
            let bucket = buckets.entry(day).or_insert_with(|| ForecastDay {
                date: day,
                rain_mm: 0.0,
                temp_min_c: entry.main.temp_min,
                temp_max_c: entry.main.temp_max,
                wind_kph,
                source: "openweather",
            });
            bucket.rain_mm += entry.rain.as_ref().map_or(0.0, |rain| rain.three_hour);
            bucket.temp_min_c = bucket.temp_min_c.min(entry.main.temp_min);
            bucket.temp_max_c = bucket.temp_max_c.max(entry.main.temp_max);
            bucket.wind_kph = bucket.wind_kph.max(wind_kph);
        }

        Ok(buckets.into_values().take(FORECAST_DAYS).collect())
    }
}

/// Deterministic stand-in forecast used when no API key is configured
pub fn synthetic_forecast() -> Vec<ForecastDay> {
    const RAIN_MM: [f64; FORECAST_DAYS] = [2.0, 4.0, 14.0, 42.0, 8.0, 1.0, 0.0];
    let today = time::today();
    (0..FORECAST_DAYS)
        .map(|i| ForecastDay {
            date: today + Days::new(i as u64),
            rain_mm: RAIN_MM[i],
            temp_min_c: 4.0 + i as f64,
            temp_max_c: 15.0 + i as f64,
            wind_kph: 12.0 + i as f64,
            source: "synthetic",
        })
        .collect()
}

/// Fetch the forecast for a farm and replace its stored rows.
/// An unknown farm yields an empty result rather than an error.
pub async fn fetch_weather_forecast(
    pool: &SqlitePool,
    client: Option<&OpenWeatherClient>,
    farm_id: &str,
) -> Result<Vec<WeatherDaily>> {
    let Some(farm) = db::farms::get(pool, farm_id).await? else {
        return Ok(Vec::new());
    };

    let forecast = match client {
        Some(client) => client.fetch_daily(farm.latitude, farm.longitude).await?,
        None => synthetic_forecast(),
    };

    let fetched_at = time::now();
    let rows: Vec<WeatherDaily> = forecast
        .into_iter()
        .map(|day| WeatherDaily {
            id: Uuid::new_v4().to_string(),
            farm_id: farm_id.to_string(),
            date: day.date,
            rain_mm: day.rain_mm,
            temp_min_c: day.temp_min_c,
            temp_max_c: day.temp_max_c,
            wind_kph: day.wind_kph,
            source: day.source.to_string(),
            fetched_at,
        })
        .collect();

    let mut tx = pool.begin().await?;
    db::weather::delete_for_farm(&mut *tx, farm_id).await?;
    for row in &rows {
        db::weather::insert(&mut *tx, row).await?;
    }
    tx.commit().await?;

    info!(farm_id, days = rows.len(), "weather forecast stored");
    Ok(rows)
}

pub async fn get_weather_forecast(pool: &SqlitePool, farm_id: &str) -> Result<Vec<WeatherDaily>> {
    db::weather::list_for_farm(pool, farm_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_forecast_shape() {
        let forecast = synthetic_forecast();
        assert_eq!(forecast.len(), 7);
        assert_eq!(forecast[0].date, time::today());
        assert_eq!(forecast[3].rain_mm, 42.0);
        assert!(forecast.iter().all(|day| day.source == "synthetic"));
        assert!(forecast.iter().all(|day| day.temp_max_c > day.temp_min_c));
    }
}
