//! Floating photovoltaic output model.
//!
//! Hourly GHI / DNI / DHI, air temperature and wind speed go in; plane-of-array
//! irradiance, cell temperature, efficiency and (derated) power come out.
//! [`compute_series`] is the entry point; each stage under [`services`] can
//! also be used on its own.

pub mod api_docs;
pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod shared_state;
pub mod telemetry;

pub use error::{ModelError, Result};
pub use models::pv::{
    DataQualityWarning, DeratingFactor, DeratingFactors, EfficiencyParameters, HourlyRecord,
    PanelConfiguration, PipelineConfig, PoaRecord, PowerParameters, SeriesOutput, Site, SkyModel,
    SolarPosition, ThermalCoefficients, WarningKind,
};
pub use services::pipeline::{compute_series, Pipeline};
