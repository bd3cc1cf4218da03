use utoipa::OpenApi;

use crate::controllers::{error, power_controller};
use crate::models::{api, pv};

#[derive(OpenApi)]
#[openapi(
    paths(
        power_controller::health,
        power_controller::get_model_config,
        power_controller::post_solar_position,
        power_controller::post_series
    ),
    components(
        schemas(
            api::HealthStatus,
            api::ModelConfigResponse,
            api::SolarPositionRequest,
            api::SolarPositionResponse,
            api::TimedSolarPosition,
            api::SeriesRequest,
            pv::PipelineConfig,
            pv::Site,
            pv::PanelConfiguration,
            pv::SkyModel,
            pv::ThermalCoefficients,
            pv::EfficiencyParameters,
            pv::PowerParameters,
            pv::DeratingFactor,
            pv::DeratingFactors,
            pv::HourlyRecord,
            pv::SolarPosition,
            pv::PoaRecord,
            pv::SeriesOutput,
            pv::DataQualityWarning,
            pv::WarningKind,
            pv::IrradianceComponent,
            pv::InputField,
            error::ErrorBody
        )
    ),
    tags(
        (name = "floating-pv-model", description = "Floating PV irradiance-to-power model")
    )
)]
pub struct ApiDoc;
