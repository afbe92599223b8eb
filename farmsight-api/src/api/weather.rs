//! Weather forecast endpoint

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::api::{farms::require_farm, ApiResult};
use crate::services::weather;
use crate::AppState;

/// GET /api/v1/farms/:farm_id/weather/forecast
///
/// Serves the stored forecast, fetching it first if none is stored.
pub async fn forecast(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> ApiResult<Json<Value>> {
    require_farm(&state, &farm_id).await?;

    let mut data = weather::get_weather_forecast(&state.db, &farm_id).await?;
    if data.is_empty() {
        data = weather::fetch_weather_forecast(&state.db, state.weather.as_deref(), &farm_id)
            .await?;
    }

    Ok(Json(json!({ "data": data, "meta": { "count": data.len() } })))
}
