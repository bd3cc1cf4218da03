use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::pv::{HourlyRecord, PipelineConfig, SolarPosition};

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct SeriesRequest {
    /// Hourly input rows, strictly increasing in time
    pub records: Vec<HourlyRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SolarPositionRequest {
    pub timestamps: Vec<DateTime<FixedOffset>>,
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct TimedSolarPosition {
    pub timestamp: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub position: SolarPosition,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SolarPositionResponse {
    pub positions: Vec<TimedSolarPosition>,
}

/// Active configuration plus the quantities derived from it at startup.
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelConfigResponse {
    pub config: PipelineConfig,
    /// Module area needed for the installed capacity (m²)
    pub total_area_m2: f64,
    /// Product of all derating factors
    pub derating_product: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub parallel: bool,
}
