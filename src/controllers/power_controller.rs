use axum::{extract::State, Json};
use tracing::debug;

use crate::controllers::error::{ApiError, ErrorBody};
use crate::models::api::{
    HealthStatus, ModelConfigResponse, SeriesRequest, SolarPositionRequest, SolarPositionResponse,
    TimedSolarPosition,
};
use crate::models::pv::SeriesOutput;
use crate::shared_state::AppState;

/// GET /api/health
/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthStatus)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        parallel: cfg!(feature = "parallel"),
    })
}

/// GET /api/model/config
/// Active model configuration
///
/// Returns the configuration loaded at startup together with the plant area
/// and the overall derating product derived from it.
#[utoipa::path(
    get,
    path = "/api/model/config",
    responses(
        (status = 200, description = "Active configuration", body = ModelConfigResponse)
    )
)]
pub async fn get_model_config(State(state): State<AppState>) -> Json<ModelConfigResponse> {
    let power = state.pipeline.power_model();
    Json(ModelConfigResponse {
        config: (*state.config).clone(),
        total_area_m2: power.total_area_m2(),
        derating_product: power.derating_product(),
    })
}

/// POST /api/solar-position
/// Apparent zenith and azimuth at the configured site
///
/// Timestamps must be strictly increasing. The site's altitude and
/// refraction temperature apply.
#[utoipa::path(
    post,
    path = "/api/solar-position",
    request_body = SolarPositionRequest,
    responses(
        (status = 200, description = "One position per timestamp, in input order", body = SolarPositionResponse),
        (status = 422, description = "Empty or non-increasing timestamps", body = ErrorBody)
    )
)]
pub async fn post_solar_position(
    State(state): State<AppState>,
    Json(req): Json<SolarPositionRequest>,
) -> Result<Json<SolarPositionResponse>, ApiError> {
    let positions = state.pipeline.geometry().positions(&req.timestamps)?;
    let positions = req
        .timestamps
        .into_iter()
        .zip(positions)
        .map(|(timestamp, position)| TimedSolarPosition { timestamp, position })
        .collect();
    Ok(Json(SolarPositionResponse { positions }))
}

/// POST /api/series
/// Run the full irradiance-to-power chain
///
/// Returns one record per input row, aligned by index, plus any data-quality
/// warnings. A non-increasing sequence or a negative wind speed rejects the
/// whole request.
#[utoipa::path(
    post,
    path = "/api/series",
    request_body = SeriesRequest,
    responses(
        (status = 200, description = "Per-row results and warnings", body = SeriesOutput),
        (status = 422, description = "Sequence or input rejected", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn post_series(
    State(state): State<AppState>,
    Json(req): Json<SeriesRequest>,
) -> Result<Json<SeriesOutput>, ApiError> {
    debug!(rows = req.records.len(), "series request");
    let pipeline = state.pipeline.clone();
    let output = tokio::task::spawn_blocking(move || pipeline.run(&req.records))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(output))
}
