//! Solar geometry stage.
//!
//! Apparent zenith / azimuth per timestamp via NREL SPA (Reda & Andreas 2003),
//! with ΔT estimated from the calendar date and a refraction correction
//! driven by the site's standard-atmosphere pressure.

use chrono::{DateTime, Datelike, FixedOffset};
use solar_positioning::{spa, time::DeltaT, RefractionCorrection};
use std::f64::consts::PI;

use crate::error::{ModelError, Result};
use crate::models::pv::{Site, SolarPosition};

// Solar constant used for the extraterrestrial normal irradiance (W/m²)
const SC: f64 = 1366.1;

pub struct SolarGeometryEngine {
    site: Site,
    refraction: RefractionCorrection,
}

impl SolarGeometryEngine {
    pub fn new(site: &Site) -> Result<Self> {
        site.validate()?;
        let refraction = RefractionCorrection::new(site.pressure_hpa(), site.refraction_temperature_c)
            .map_err(|e| ModelError::config(format!("refraction parameters rejected: {e}")))?;
        Ok(Self { site: site.clone(), refraction })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Position of the sun at a single instant.
    pub fn position(&self, timestamp: DateTime<FixedOffset>) -> Result<SolarPosition> {
        let delta_t = DeltaT::estimate_from_date_like(timestamp)
            .map_err(|e| ModelError::sequence(format!("no ΔT estimate for {timestamp}: {e}")))?;
        let pos = spa::solar_position(
            timestamp,
            self.site.latitude,
            self.site.longitude,
            self.site.altitude_m,
            delta_t,
            Some(self.refraction.clone()),
        )
        .map_err(|e| ModelError::sequence(format!("solar position failed for {timestamp}: {e}")))?;

        Ok(SolarPosition {
            apparent_zenith: pos.zenith_angle(),
            azimuth: pos.azimuth(),
        })
    }

    /// One position per timestamp, order preserved.
    ///
    /// The sequence must be non-empty and strictly increasing.
    pub fn positions(&self, timestamps: &[DateTime<FixedOffset>]) -> Result<Vec<SolarPosition>> {
        check_monotonic(timestamps)?;
        timestamps.iter().map(|t| self.position(*t)).collect()
    }
}

/// Fails with `InvalidSequence` on an empty or non strictly increasing sequence.
pub fn check_monotonic(timestamps: &[DateTime<FixedOffset>]) -> Result<()> {
    if timestamps.is_empty() {
        return Err(ModelError::sequence("timestamp sequence is empty"));
    }
    for (i, pair) in timestamps.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(ModelError::sequence(format!(
                "timestamp at row {} ({}) does not follow row {} ({})",
                i + 1,
                pair[1],
                i,
                pair[0]
            )));
        }
    }
    Ok(())
}

/// Extraterrestrial normal irradiance for a day of the year (Spencer 1971).
pub fn extraterrestrial_dni(day_of_year: u32) -> f64 {
    let b = 2.0 * PI * (day_of_year as f64 - 1.0) / 365.0;
    SC * (1.00011
        + 0.034221 * b.cos()
        + 0.00128 * b.sin()
        + 0.000719 * (2.0 * b).cos()
        + 0.000077 * (2.0 * b).sin())
}

/// Convenience for callers holding a timestamp rather than a day number.
pub fn extraterrestrial_dni_at(timestamp: &DateTime<FixedOffset>) -> f64 {
    extraterrestrial_dni(timestamp.ordinal())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(lat: f64, lon: f64) -> SolarGeometryEngine {
        SolarGeometryEngine::new(&Site::new(lat, lon, "UTC").unwrap()).unwrap()
    }

    fn ts(s: &str) -> DateTime<FixedOffset> {
        s.parse().unwrap()
    }

    #[test]
    fn test_summer_noon_italy() {
        // Solar noon at 10°E on the June solstice is ~11:22 UTC
        let pos = engine(45.0, 10.0).position(ts("2024-06-21T11:22:00Z")).unwrap();
        assert!((pos.apparent_zenith - 21.56).abs() < 0.2, "zenith {:.3}", pos.apparent_zenith);
        assert!((pos.azimuth - 180.0).abs() < 3.0, "azimuth {:.3}", pos.azimuth);
    }

    #[test]
    fn test_offset_does_not_change_instant() {
        let e = engine(45.0, 10.0);
        let a = e.position(ts("2024-06-21T11:00:00Z")).unwrap();
        let b = e.position(ts("2024-06-21T13:00:00+02:00")).unwrap();
        assert!((a.apparent_zenith - b.apparent_zenith).abs() < 1e-9);
        assert!((a.azimuth - b.azimuth).abs() < 1e-9);
    }

    #[test]
    fn test_midnight_below_horizon() {
        let pos = engine(45.0, 10.0).position(ts("2024-06-21T23:00:00Z")).unwrap();
        assert!(pos.is_below_horizon());
        assert!(pos.azimuth >= 0.0 && pos.azimuth < 360.0);
    }

    #[test]
    fn test_morning_sun_is_east() {
        let pos = engine(45.0, 10.0).position(ts("2024-03-20T07:00:00Z")).unwrap();
        assert!(pos.azimuth > 90.0 && pos.azimuth < 180.0, "azimuth {:.1}", pos.azimuth);
    }

    #[test]
    fn test_positions_keep_length_and_order() {
        let e = engine(45.0, 10.0);
        let times: Vec<_> = (0..24)
            .map(|h| ts(&format!("2024-03-20T{h:02}:00:00Z")))
            .collect();
        let positions = e.positions(&times).unwrap();
        assert_eq!(positions.len(), 24);
        let noon = &positions[11];
        assert!(positions.iter().all(|p| p.apparent_zenith >= noon.apparent_zenith - 1.0));
    }

    #[test]
    fn test_rejects_empty_and_non_monotonic() {
        let e = engine(45.0, 10.0);
        assert!(matches!(e.positions(&[]), Err(ModelError::InvalidSequence(_))));
        let times = [ts("2024-03-20T02:00:00Z"), ts("2024-03-20T01:00:00Z")];
        assert!(matches!(e.positions(&times), Err(ModelError::InvalidSequence(_))));
        let dup = [ts("2024-03-20T02:00:00Z"), ts("2024-03-20T04:00:00+02:00")];
        assert!(matches!(e.positions(&dup), Err(ModelError::InvalidSequence(_))));
    }

    #[test]
    fn test_extraterrestrial_dni_annual_swing() {
        // Perihelion in early January, aphelion in early July
        assert!(extraterrestrial_dni(3) > 1405.0);
        assert!(extraterrestrial_dni(185) < 1325.0);
    }
}
