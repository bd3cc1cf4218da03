//! ============================================================
//!  Floating PV output pipeline
//!
//!  Per hourly row:
//!   1. Solar geometry   – apparent zenith / azimuth (SPA)
//!   2. Transposition    – GHI/DNI/DHI → POA direct + sky + water-reflected
//!   3. Cell temperature – PVsyst/Faiman steady-state model
//!   4. Efficiency       – η = η_stc · (1 − γ · (T_cell − T_stc))
//!   5. Power            – specific power × plant area, then derating
//!
//!  Rows are independent; data-quality findings are collected per row and
//!  returned with the results instead of aborting the run.
//! ============================================================

use std::time::Instant;

use chrono::DateTime;
use chrono::FixedOffset;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::pv::{
    DataQualityWarning, HourlyRecord, InputField, PipelineConfig, PoaRecord, SeriesOutput,
    SolarPosition, WarningKind,
};
use crate::services::efficiency::EfficiencyModel;
use crate::services::power_model::PowerModel;
use crate::services::solar_geometry::{check_monotonic, extraterrestrial_dni_at, SolarGeometryEngine};
use crate::services::thermal::CellThermalModel;
use crate::services::transposition::{HorizontalIrradiance, TranspositionEngine};

const EXPECTED_STEP_MINUTES: i64 = 60;

/// All stages, validated and ready to map rows.
pub struct Pipeline {
    geometry: SolarGeometryEngine,
    transposition: TranspositionEngine,
    thermal: CellThermalModel,
    efficiency: EfficiencyModel,
    power: PowerModel,
}

impl Pipeline {
    /// Validates every configuration section. Nothing is computed yet.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            geometry: SolarGeometryEngine::new(&config.site)?,
            transposition: TranspositionEngine::new(&config.panel)?,
            thermal: CellThermalModel::new(&config.thermal)?,
            efficiency: EfficiencyModel::new(&config.efficiency)?,
            power: PowerModel::new(&config.power, &config.derating)?,
        })
    }

    pub fn geometry(&self) -> &SolarGeometryEngine {
        &self.geometry
    }

    pub fn power_model(&self) -> &PowerModel {
        &self.power
    }

    pub fn run(&self, records: &[HourlyRecord]) -> Result<SeriesOutput> {
        let started = Instant::now();

        let timestamps: Vec<DateTime<FixedOffset>> = records.iter().map(|r| r.timestamp).collect();
        check_monotonic(&timestamps)?;
        for (row, r) in records.iter().enumerate() {
            CellThermalModel::check_wind_speed(row, r.wind_speed)?;
        }

        let rows = self.map_rows(records)?;

        let mut output = SeriesOutput {
            records: Vec::with_capacity(rows.len()),
            warnings: Vec::new(),
        };
        for (record, warnings) in rows {
            output.records.push(record);
            output.warnings.extend(warnings);
        }
        for w in spacing_warnings(&timestamps) {
            output.records[w.row].flagged = true;
            output.warnings.push(w);
        }
        output.warnings.sort_by_key(|w| w.row);

        log_summary(&output, started);
        Ok(output)
    }

    #[cfg(not(feature = "parallel"))]
    fn map_rows(&self, records: &[HourlyRecord]) -> Result<Vec<(PoaRecord, Vec<DataQualityWarning>)>> {
        records
            .iter()
            .enumerate()
            .map(|(row, r)| self.compute_row(row, r))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn map_rows(&self, records: &[HourlyRecord]) -> Result<Vec<(PoaRecord, Vec<DataQualityWarning>)>> {
        use rayon::prelude::*;
        records
            .par_iter()
            .enumerate()
            .map(|(row, r)| self.compute_row(row, r))
            .collect()
    }

    fn compute_row(&self, row: usize, r: &HourlyRecord) -> Result<(PoaRecord, Vec<DataQualityWarning>)> {
        let position: SolarPosition = self.geometry.position(r.timestamp)?;
        let dni_extra = extraterrestrial_dni_at(&r.timestamp);

        let (poa, mut findings) = self.transposition.transpose(
            HorizontalIrradiance { ghi: r.ghi, dni: r.dni, dhi: r.dhi },
            &position,
            dni_extra,
        );
        if !r.air_temp.is_finite() {
            findings.push(WarningKind::NonFiniteInput { field: InputField::AirTemp });
        }
        if !r.wind_speed.is_finite() {
            findings.push(WarningKind::NonFiniteInput { field: InputField::WindSpeed });
        }

        let cell_temp = self.thermal.cell_temperature(poa.poa_global, r.air_temp, r.wind_speed);
        let efficiency = self.efficiency.efficiency(cell_temp);
        let power = self.power.output(efficiency, poa.poa_global);

        let record = PoaRecord {
            timestamp: r.timestamp,
            apparent_zenith: position.apparent_zenith,
            azimuth: position.azimuth,
            aoi: poa.aoi,
            poa_global: poa.poa_global,
            poa_direct: poa.poa_direct,
            poa_diffuse: poa.poa_diffuse,
            poa_sky_diffuse: poa.poa_sky_diffuse,
            poa_ground_diffuse: poa.poa_ground_diffuse,
            cell_temp,
            efficiency,
            specific_power: power.specific_power,
            derated_specific_power: power.derated_specific_power,
            power: power.power,
            derated_power: power.derated_power,
            derating_steps: power.derating_steps,
            flagged: !findings.is_empty(),
        };
        let warnings = findings
            .into_iter()
            .map(|kind| DataQualityWarning { row, timestamp: r.timestamp, kind })
            .collect();
        Ok((record, warnings))
    }
}

/// Runs the whole pipeline: configuration and sequence checks first, then
/// the per-row map.
///
/// Fails with `InvalidConfiguration`, `InvalidSequence` or `InvalidInput`
/// before producing any output; everything else is reported as a
/// [`DataQualityWarning`].
pub fn compute_series(config: &PipelineConfig, records: &[HourlyRecord]) -> Result<SeriesOutput> {
    Pipeline::new(config)?.run(records)
}

fn spacing_warnings(timestamps: &[DateTime<FixedOffset>]) -> Vec<DataQualityWarning> {
    timestamps
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let actual = (pair[1] - pair[0]).num_minutes();
            (actual != EXPECTED_STEP_MINUTES).then(|| DataQualityWarning {
                row: i + 1,
                timestamp: pair[1],
                kind: WarningKind::IrregularSpacing {
                    expected_minutes: EXPECTED_STEP_MINUTES,
                    actual_minutes: actual,
                },
            })
        })
        .collect()
}

fn log_summary(output: &SeriesOutput, started: Instant) {
    let flagged = output.flagged_rows().count();
    info!(
        rows = output.records.len(),
        warnings = output.warnings.len(),
        flagged_rows = flagged,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "series computed"
    );

    if !output.warnings.is_empty() {
        let (mut clamped, mut non_finite, mut below_horizon, mut spacing) = (0usize, 0usize, 0usize, 0usize);
        for w in &output.warnings {
            match w.kind {
                WarningKind::NegativeIrradianceClamped { .. } => clamped += 1,
                WarningKind::NonFiniteInput { .. } => non_finite += 1,
                WarningKind::DirectZeroedBelowHorizon { .. } => below_horizon += 1,
                WarningKind::IrregularSpacing { .. } => spacing += 1,
            }
        }
        debug!(clamped, non_finite, below_horizon, spacing, "data-quality warnings by kind");
    }

    if cfg!(feature = "verbose_log") {
        for w in &output.warnings {
            warn!(row = w.row, timestamp = %w.timestamp, kind = ?w.kind, "data-quality warning");
        }
    }
}
