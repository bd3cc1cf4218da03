use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::{ModelError, Result};

// ─── Site ────────────────────────────────────────────────────────────────────

fn default_refraction_temperature() -> f64 { 12.0 }

/// Geographic location of the plant. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Site {
    /// Latitude in degrees (−90 … +90)
    pub latitude: f64,
    /// Longitude in degrees (−180 … +180), east positive
    pub longitude: f64,
    /// IANA time zone identifier, e.g. `CET` or `Europe/Rome`
    pub timezone: String,
    /// Height above sea level (m)
    #[serde(default)]
    pub altitude_m: f64,
    /// Air temperature used by the refraction correction (°C)
    #[serde(default = "default_refraction_temperature")]
    pub refraction_temperature_c: f64,
}

impl Site {
    pub fn new(latitude: f64, longitude: f64, timezone: &str) -> Result<Self> {
        let site = Site {
            latitude,
            longitude,
            timezone: timezone.to_string(),
            altitude_m: 0.0,
            refraction_temperature_c: default_refraction_temperature(),
        };
        site.validate()?;
        Ok(site)
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Result<Self> {
        self.altitude_m = altitude_m;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || self.latitude.abs() > 90.0 {
            return Err(ModelError::config(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ModelError::config(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        if !self.altitude_m.is_finite() || !self.refraction_temperature_c.is_finite() {
            return Err(ModelError::config("site altitude and refraction temperature must be finite"));
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ModelError::config(format!("unknown time zone '{}'", self.timezone)))
    }

    /// Standard-atmosphere pressure at the site altitude, in hPa.
    pub fn pressure_hpa(&self) -> f64 {
        let pa = 100.0 * ((44331.514 - self.altitude_m) / 11880.516).powf(1.0 / 0.1902632);
        pa / 100.0
    }

    /// Hourly timestamps from local midnight of `start` (inclusive) to local
    /// midnight of `end` (exclusive), in the site time zone.
    ///
    /// Steps are one hour of absolute time, so DST days yield 23 or 25 entries.
    pub fn hourly_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DateTime<FixedOffset>>> {
        if end <= start {
            return Err(ModelError::sequence(format!("range end {end} is not after start {start}")));
        }
        let tz = self.tz()?;
        let local_midnight = |d: NaiveDate| {
            tz.from_local_datetime(&d.and_time(NaiveTime::MIN))
                .single()
                .ok_or_else(|| ModelError::sequence(format!(
                    "local midnight of {d} is ambiguous or skipped in {}",
                    self.timezone
                )))
        };
        let first = local_midnight(start)?.with_timezone(&Utc);
        let last = local_midnight(end)?.with_timezone(&Utc);

        let mut times = Vec::new();
        let mut t = first;
        while t < last {
            times.push(t.with_timezone(&tz).fixed_offset());
            t += TimeDelta::hours(1);
        }
        Ok(times)
    }
}

// ─── Panel / sky model ───────────────────────────────────────────────────────

/// Sky-diffuse transposition model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkyModel {
    #[default]
    Isotropic,
    Klucher,
    HayDavies,
    Reindl,
}

fn default_tilt() -> f64 { 30.0 }
fn default_surface_azimuth() -> f64 { 180.0 }
fn default_albedo() -> f64 { 0.25 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PanelConfiguration {
    /// Tilt from horizontal (°), 0 … 90
    #[serde(default = "default_tilt")]
    pub tilt: f64,
    /// Orientation (°), 0 = North, 180 = South, clockwise
    #[serde(default = "default_surface_azimuth")]
    pub surface_azimuth: f64,
    /// Reflectance of the surface in front of the array
    #[serde(default = "default_albedo")]
    pub albedo: f64,
    #[serde(default)]
    pub sky_model: SkyModel,
}

impl Default for PanelConfiguration {
    fn default() -> Self {
        Self {
            tilt: default_tilt(),
            surface_azimuth: default_surface_azimuth(),
            albedo: default_albedo(),
            sky_model: SkyModel::default(),
        }
    }
}

// ─── Thermal / efficiency ────────────────────────────────────────────────────

fn default_u_c() -> f64 { 31.9 }
fn default_u_v() -> f64 { 1.5 }
fn default_absorptance() -> f64 { 1.0 }

/// Heat-loss coefficients of the mounting technology.
///
/// Defaults are for a monofacial open free-standing structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ThermalCoefficients {
    /// Constant heat transfer component, W/(m²·K)
    #[serde(default = "default_u_c")]
    pub u_c: f64,
    /// Convective heat transfer component, W/(m²·K)/(m/s)
    #[serde(default = "default_u_v")]
    pub u_v: f64,
    /// Fraction of POA irradiance absorbed by the module
    #[serde(default = "default_absorptance")]
    pub absorptance: f64,
    /// Fraction of absorbed irradiance leaving as electricity
    #[serde(default)]
    pub module_efficiency: f64,
}

impl Default for ThermalCoefficients {
    fn default() -> Self {
        Self {
            u_c: default_u_c(),
            u_v: default_u_v(),
            absorptance: default_absorptance(),
            module_efficiency: 0.0,
        }
    }
}

fn default_eta_stc() -> f64 { 0.1649 }
fn default_gamma() -> f64 { 0.004 }
fn default_t_ref_stc() -> f64 { 25.0 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EfficiencyParameters {
    /// Module efficiency at STC (fraction)
    #[serde(default = "default_eta_stc")]
    pub eta_stc: f64,
    /// Relative efficiency loss per kelvin above `t_ref_stc`
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// STC cell temperature (°C)
    #[serde(default = "default_t_ref_stc")]
    pub t_ref_stc: f64,
}

impl Default for EfficiencyParameters {
    fn default() -> Self {
        Self {
            eta_stc: default_eta_stc(),
            gamma: default_gamma(),
            t_ref_stc: default_t_ref_stc(),
        }
    }
}

// ─── Power / derating ────────────────────────────────────────────────────────

fn default_installed_capacity() -> f64 { 1000.0 }
fn default_rated_power() -> f64 { 320.0 }
fn default_module_area() -> f64 { 1.983 * 0.994 }

/// Plant size plus the reference module used to derive the covered area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PowerParameters {
    /// Installed DC capacity (kW)
    #[serde(default = "default_installed_capacity")]
    pub installed_capacity_kw: f64,
    /// Reference module rating (Wp)
    #[serde(default = "default_rated_power")]
    pub rated_power_wp: f64,
    /// Reference module area (m²)
    #[serde(default = "default_module_area")]
    pub module_area_m2: f64,
}

impl Default for PowerParameters {
    fn default() -> Self {
        Self {
            installed_capacity_kw: default_installed_capacity(),
            rated_power_wp: default_rated_power(),
            module_area_m2: default_module_area(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeratingFactor {
    pub name: String,
    /// Multiplier in (0, 1]
    pub factor: f64,
}

impl DeratingFactor {
    pub fn new(name: impl Into<String>, factor: f64) -> Self {
        Self { name: name.into(), factor }
    }

    /// `from_loss_percent("humidity", 6.6)` gives a factor of 0.934.
    pub fn from_loss_percent(name: impl Into<String>, loss_percent: f64) -> Self {
        Self::new(name, 1.0 - loss_percent / 100.0)
    }
}

/// Ordered derating chain. The product is order-independent, the order is
/// kept so each cumulative step can be reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct DeratingFactors(pub Vec<DeratingFactor>);

impl DeratingFactors {
    pub fn iter(&self) -> impl Iterator<Item = &DeratingFactor> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn product(&self) -> f64 {
        self.0.iter().map(|d| d.factor).product()
    }
}

impl Default for DeratingFactors {
    fn default() -> Self {
        DeratingFactors(vec![
            DeratingFactor::from_loss_percent("wave_induced", 10.0),
            DeratingFactor::from_loss_percent("humidity", 6.6),
        ])
    }
}

// ─── Pipeline configuration ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PipelineConfig {
    pub site: Site,
    #[serde(default)]
    pub panel: PanelConfiguration,
    #[serde(default)]
    pub thermal: ThermalCoefficients,
    #[serde(default)]
    pub efficiency: EfficiencyParameters,
    #[serde(default)]
    pub power: PowerParameters,
    #[serde(default)]
    pub derating: DeratingFactors,
}

impl PipelineConfig {
    /// Reference floating plant at `site`.
    pub fn for_site(site: Site) -> Self {
        Self {
            site,
            panel: PanelConfiguration::default(),
            thermal: ThermalCoefficients::default(),
            efficiency: EfficiencyParameters::default(),
            power: PowerParameters::default(),
            derating: DeratingFactors::default(),
        }
    }
}

// ─── Input records ───────────────────────────────────────────────────────────

/// JSON has no NaN, missing sensor readings arrive as `null`.
fn nullable_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// One hour of solar-resource data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HourlyRecord {
    pub timestamp: DateTime<FixedOffset>,
    /// Global horizontal irradiance (W/m²)
    #[serde(deserialize_with = "nullable_f64")]
    pub ghi: f64,
    /// Direct normal irradiance (W/m²)
    #[serde(deserialize_with = "nullable_f64")]
    pub dni: f64,
    /// Diffuse horizontal irradiance (W/m²)
    #[serde(deserialize_with = "nullable_f64")]
    pub dhi: f64,
    /// Air temperature (°C)
    #[serde(deserialize_with = "nullable_f64")]
    pub air_temp: f64,
    /// Wind speed (m/s)
    #[serde(deserialize_with = "nullable_f64")]
    pub wind_speed: f64,
}

// ─── Derived records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SolarPosition {
    /// Refraction-corrected zenith angle (°), 0 … 180
    pub apparent_zenith: f64,
    /// Azimuth (°), 0 = North, clockwise, 0 … 360
    pub azimuth: f64,
}

impl SolarPosition {
    pub fn is_below_horizon(&self) -> bool {
        self.apparent_zenith >= 90.0
    }
}

/// Plane-of-array irradiance split into its components (W/m²).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PoaComponents {
    pub aoi: f64,
    pub poa_global: f64,
    pub poa_direct: f64,
    pub poa_diffuse: f64,
    pub poa_sky_diffuse: f64,
    pub poa_ground_diffuse: f64,
}

/// Power figures for one row.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PowerOutput {
    /// kW/m²
    pub specific_power: f64,
    /// kW/m², after every derating factor
    pub derated_specific_power: f64,
    /// kW
    pub power: f64,
    /// kW
    pub derated_power: f64,
    /// Power after each derating factor, in factor order (kW)
    pub derating_steps: Vec<f64>,
}

/// One output row, aligned with the input row of the same index.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PoaRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub apparent_zenith: f64,
    pub azimuth: f64,
    /// Angle of incidence on the panel (°)
    pub aoi: f64,
    pub poa_global: f64,
    pub poa_direct: f64,
    pub poa_diffuse: f64,
    pub poa_sky_diffuse: f64,
    pub poa_ground_diffuse: f64,
    /// Cell temperature (°C)
    pub cell_temp: f64,
    /// Temperature-corrected efficiency (fraction, unclamped)
    pub efficiency: f64,
    /// kW/m²
    pub specific_power: f64,
    /// kW/m²
    pub derated_specific_power: f64,
    /// kW
    pub power: f64,
    /// kW
    pub derated_power: f64,
    /// kW, cumulative per derating factor
    pub derating_steps: Vec<f64>,
    /// Set when any data-quality warning refers to this row
    pub flagged: bool,
}

// ─── Data quality ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IrradianceComponent {
    Ghi,
    Dni,
    Dhi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    Ghi,
    Dni,
    Dhi,
    AirTemp,
    WindSpeed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    NegativeIrradianceClamped { component: IrradianceComponent, value: f64 },
    NonFiniteInput { field: InputField },
    DirectZeroedBelowHorizon { dni: f64, apparent_zenith: f64 },
    IrregularSpacing { expected_minutes: i64, actual_minutes: i64 },
}

/// Non-fatal per-row finding, returned next to the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DataQualityWarning {
    pub row: usize,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SeriesOutput {
    pub records: Vec<PoaRecord>,
    pub warnings: Vec<DataQualityWarning>,
}

impl SeriesOutput {
    pub fn flagged_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.flagged)
            .map(|(i, _)| i)
    }
}
