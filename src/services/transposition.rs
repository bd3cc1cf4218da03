//! Plane-of-array transposition.
//!
//! Horizontal GHI / DNI / DHI plus the sun's position are resolved onto the
//! tilted panel: beam through the angle of incidence, sky diffuse through the
//! configured sky model, and the water-reflected part through the albedo.

use crate::error::{ModelError, Result};
use crate::models::pv::{
    InputField, IrradianceComponent, PanelConfiguration, PoaComponents, SkyModel, SolarPosition,
    WarningKind,
};

// cos(89°), floor for the zenith cosine in beam ratios
const MIN_COS_ZENITH: f64 = 0.01745;

/// Horizontal irradiance for one row (W/m²).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalIrradiance {
    pub ghi: f64,
    pub dni: f64,
    pub dhi: f64,
}

pub struct TranspositionEngine {
    panel: PanelConfiguration,
    cos_tilt: f64,
    sin_tilt: f64,
    // sin³(β/2), shared by Klucher and Reindl
    horizon_brightening: f64,
}

impl TranspositionEngine {
    pub fn new(panel: &PanelConfiguration) -> Result<Self> {
        if !(0.0..=90.0).contains(&panel.tilt) {
            return Err(ModelError::config(format!("tilt {} outside [0, 90]", panel.tilt)));
        }
        if !(0.0..360.0).contains(&panel.surface_azimuth) {
            return Err(ModelError::config(format!(
                "surface azimuth {} outside [0, 360)",
                panel.surface_azimuth
            )));
        }
        if !(0.0..=1.0).contains(&panel.albedo) {
            return Err(ModelError::config(format!("albedo {} outside [0, 1]", panel.albedo)));
        }
        let tilt = panel.tilt.to_radians();
        Ok(Self {
            panel: panel.clone(),
            cos_tilt: tilt.cos(),
            sin_tilt: tilt.sin(),
            horizon_brightening: (tilt / 2.0).sin().powi(3),
        })
    }

    pub fn sky_model(&self) -> SkyModel {
        self.panel.sky_model
    }

    /// Cosine of the angle of incidence, clipped to [-1, 1].
    pub fn aoi_projection(&self, position: &SolarPosition) -> f64 {
        let zen = position.apparent_zenith.to_radians();
        let az_diff = (position.azimuth - self.panel.surface_azimuth).to_radians();
        (self.cos_tilt * zen.cos() + self.sin_tilt * zen.sin() * az_diff.cos()).clamp(-1.0, 1.0)
    }

    /// Transposes one row. `dni_extra` is only read by the Hay-Davies and
    /// Reindl models.
    ///
    /// Returns the components plus any data-quality findings for the row.
    pub fn transpose(
        &self,
        input: HorizontalIrradiance,
        position: &SolarPosition,
        dni_extra: f64,
    ) -> (PoaComponents, Vec<WarningKind>) {
        let mut findings = Vec::new();
        let ghi = sanitize(input.ghi, IrradianceComponent::Ghi, &mut findings);
        let dni = sanitize(input.dni, IrradianceComponent::Dni, &mut findings);
        let dhi = sanitize(input.dhi, IrradianceComponent::Dhi, &mut findings);

        let cos_aoi = self.aoi_projection(position);
        let below_horizon = position.is_below_horizon();

        let poa_direct = if below_horizon {
            if dni > 0.0 {
                findings.push(WarningKind::DirectZeroedBelowHorizon {
                    dni,
                    apparent_zenith: position.apparent_zenith,
                });
            }
            0.0
        } else {
            non_negative(dni * cos_aoi)
        };

        let poa_sky_diffuse = self.sky_diffuse(ghi, dni, dhi, position, cos_aoi, dni_extra);
        let poa_ground_diffuse = ghi * self.panel.albedo * (1.0 - self.cos_tilt) / 2.0;
        let poa_diffuse = poa_sky_diffuse + poa_ground_diffuse;

        let components = PoaComponents {
            aoi: cos_aoi.acos().to_degrees(),
            poa_global: poa_direct + poa_diffuse,
            poa_direct,
            poa_diffuse,
            poa_sky_diffuse,
            poa_ground_diffuse,
        };
        (components, findings)
    }

    fn sky_diffuse(
        &self,
        ghi: f64,
        dni: f64,
        dhi: f64,
        position: &SolarPosition,
        cos_aoi: f64,
        dni_extra: f64,
    ) -> f64 {
        let isotropic = (1.0 + self.cos_tilt) / 2.0;
        let zen = position.apparent_zenith.to_radians();

        match self.panel.sky_model {
            SkyModel::Isotropic => dhi * isotropic,
            SkyModel::Klucher => {
                // Modulating function, 0 under overcast sky, 1 under clear sky
                let f = if ghi > 0.0 { (1.0 - (dhi / ghi).powi(2)).clamp(0.0, 1.0) } else { 0.0 };
                let horizon = 1.0 + f * self.horizon_brightening;
                let circumsolar = 1.0 + f * cos_aoi.max(0.0).powi(2) * zen.sin().powi(3);
                dhi * isotropic * horizon * circumsolar
            }
            SkyModel::HayDavies => {
                let ai = anisotropy_index(dni, dni_extra);
                let rb = beam_ratio(position, cos_aoi);
                non_negative(dhi * (ai * rb + (1.0 - ai) * isotropic))
            }
            SkyModel::Reindl => {
                let ai = anisotropy_index(dni, dni_extra);
                let rb = beam_ratio(position, cos_aoi);
                let horizon = if ghi > 0.0 {
                    let beam_horizontal = non_negative(dni * zen.cos());
                    1.0 + (beam_horizontal / ghi).sqrt() * self.horizon_brightening
                } else {
                    1.0
                };
                non_negative(dhi * (ai * rb + (1.0 - ai) * isotropic * horizon))
            }
        }
    }
}

/// Clamps negative readings to zero and reports them; NaN passes through
/// but is reported.
fn sanitize(value: f64, component: IrradianceComponent, findings: &mut Vec<WarningKind>) -> f64 {
    if !value.is_finite() {
        let field = match component {
            IrradianceComponent::Ghi => InputField::Ghi,
            IrradianceComponent::Dni => InputField::Dni,
            IrradianceComponent::Dhi => InputField::Dhi,
        };
        findings.push(WarningKind::NonFiniteInput { field });
        value
    } else if value < 0.0 {
        findings.push(WarningKind::NegativeIrradianceClamped { component, value });
        0.0
    } else {
        value
    }
}

// f64::max would turn NaN into 0
fn non_negative(x: f64) -> f64 {
    if x < 0.0 { 0.0 } else { x }
}

fn anisotropy_index(dni: f64, dni_extra: f64) -> f64 {
    if dni_extra > 0.0 { (dni / dni_extra).clamp(0.0, 1.0) } else { 0.0 }
}

fn beam_ratio(position: &SolarPosition, cos_aoi: f64) -> f64 {
    if position.is_below_horizon() {
        return 0.0;
    }
    let cos_zen = position.apparent_zenith.to_radians().cos().max(MIN_COS_ZENITH);
    cos_aoi.max(0.0) / cos_zen
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DNI_EXTRA: f64 = 1367.0;

    fn panel(tilt: f64, azimuth: f64, sky_model: SkyModel) -> TranspositionEngine {
        TranspositionEngine::new(&PanelConfiguration {
            tilt,
            surface_azimuth: azimuth,
            albedo: 0.25,
            sky_model,
        })
        .unwrap()
    }

    fn sun(apparent_zenith: f64, azimuth: f64) -> SolarPosition {
        SolarPosition { apparent_zenith, azimuth }
    }

    fn irr(ghi: f64, dni: f64, dhi: f64) -> HorizontalIrradiance {
        HorizontalIrradiance { ghi, dni, dhi }
    }

    #[test]
    fn test_horizontal_panel_sees_ghi_components() {
        let e = panel(0.0, 180.0, SkyModel::Isotropic);
        let (poa, findings) = e.transpose(irr(800.0, 700.0, 150.0), &sun(30.0, 160.0), DNI_EXTRA);
        assert!(findings.is_empty());
        assert!((poa.poa_direct - 700.0 * 30f64.to_radians().cos()).abs() < 1e-9);
        assert_eq!(poa.poa_sky_diffuse, 150.0);
        assert_eq!(poa.poa_ground_diffuse, 0.0);
        assert!((poa.aoi - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_isotropic_tilted_south_noon() {
        let e = panel(30.0, 180.0, SkyModel::Isotropic);
        let (poa, _) = e.transpose(irr(800.0, 700.0, 150.0), &sun(21.6, 180.0), DNI_EXTRA);
        assert!((poa.aoi - 8.4).abs() < 1e-9);
        assert!((poa.poa_sky_diffuse - 150.0 * (1.0 + 30f64.to_radians().cos()) / 2.0).abs() < 1e-9);
        assert!((poa.poa_ground_diffuse - 800.0 * 0.25 * (1.0 - 30f64.to_radians().cos()) / 2.0).abs() < 1e-9);
        assert!(poa.poa_global > 750.0 && poa.poa_global < 900.0, "poa {}", poa.poa_global);
    }

    #[rstest]
    #[case(SkyModel::Isotropic)]
    #[case(SkyModel::Klucher)]
    #[case(SkyModel::HayDavies)]
    #[case(SkyModel::Reindl)]
    fn test_sun_below_horizon_zeroes_direct(#[case] model: SkyModel) {
        let e = panel(30.0, 180.0, model);
        let (poa, findings) = e.transpose(irr(20.0, 500.0, 20.0), &sun(95.0, 300.0), DNI_EXTRA);
        assert_eq!(poa.poa_direct, 0.0);
        assert!(findings.contains(&WarningKind::DirectZeroedBelowHorizon { dni: 500.0, apparent_zenith: 95.0 }));
        assert_eq!(poa.poa_global, poa.poa_direct + poa.poa_diffuse);
    }

    #[test]
    fn test_no_finding_when_night_dni_is_zero() {
        let e = panel(30.0, 180.0, SkyModel::Isotropic);
        let (poa, findings) = e.transpose(irr(0.0, 0.0, 0.0), &sun(120.0, 0.0), DNI_EXTRA);
        assert_eq!(poa.poa_global, 0.0);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_negative_readings_are_clamped_and_reported() {
        let e = panel(30.0, 180.0, SkyModel::Isotropic);
        let (poa, findings) = e.transpose(irr(-2.0, 0.0, -1.5), &sun(89.0, 80.0), DNI_EXTRA);
        assert_eq!(poa.poa_global, 0.0);
        assert_eq!(findings, vec![
            WarningKind::NegativeIrradianceClamped { component: IrradianceComponent::Ghi, value: -2.0 },
            WarningKind::NegativeIrradianceClamped { component: IrradianceComponent::Dhi, value: -1.5 },
        ]);
    }

    #[test]
    fn test_nan_propagates() {
        let e = panel(30.0, 180.0, SkyModel::Isotropic);
        let (poa, findings) = e.transpose(irr(800.0, f64::NAN, 150.0), &sun(40.0, 180.0), DNI_EXTRA);
        assert!(poa.poa_direct.is_nan());
        assert!(poa.poa_global.is_nan());
        assert!(!poa.poa_diffuse.is_nan());
        assert_eq!(findings, vec![WarningKind::NonFiniteInput { field: InputField::Dni }]);
    }

    #[test]
    fn test_panel_facing_away_gets_no_beam() {
        let e = panel(60.0, 0.0, SkyModel::Isotropic);
        let (poa, _) = e.transpose(irr(600.0, 800.0, 100.0), &sun(50.0, 180.0), DNI_EXTRA);
        assert_eq!(poa.poa_direct, 0.0);
        assert!(poa.aoi > 90.0);
    }

    #[test]
    fn test_klucher_overcast_matches_isotropic() {
        let iso = panel(30.0, 180.0, SkyModel::Isotropic);
        let klu = panel(30.0, 180.0, SkyModel::Klucher);
        let s = sun(50.0, 170.0);
        let (a, _) = iso.transpose(irr(200.0, 0.0, 200.0), &s, DNI_EXTRA);
        let (b, _) = klu.transpose(irr(200.0, 0.0, 200.0), &s, DNI_EXTRA);
        assert!((a.poa_sky_diffuse - b.poa_sky_diffuse).abs() < 1e-9);
    }

    #[rstest]
    #[case(SkyModel::Klucher)]
    #[case(SkyModel::HayDavies)]
    #[case(SkyModel::Reindl)]
    fn test_anisotropic_models_add_circumsolar_on_clear_day(#[case] model: SkyModel) {
        let iso = panel(30.0, 180.0, SkyModel::Isotropic);
        let other = panel(30.0, 180.0, model);
        let s = sun(35.0, 180.0);
        let (a, _) = iso.transpose(irr(850.0, 850.0, 100.0), &s, DNI_EXTRA);
        let (b, _) = other.transpose(irr(850.0, 850.0, 100.0), &s, DNI_EXTRA);
        assert!(b.poa_sky_diffuse > a.poa_sky_diffuse, "{model:?}: {} vs {}", b.poa_sky_diffuse, a.poa_sky_diffuse);
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let bad = |tilt, surface_azimuth, albedo| {
            TranspositionEngine::new(&PanelConfiguration { tilt, surface_azimuth, albedo, sky_model: SkyModel::Isotropic })
        };
        assert!(matches!(bad(95.0, 180.0, 0.25), Err(ModelError::InvalidConfiguration(_))));
        assert!(matches!(bad(30.0, 360.0, 0.25), Err(ModelError::InvalidConfiguration(_))));
        assert!(matches!(bad(30.0, 180.0, 1.5), Err(ModelError::InvalidConfiguration(_))));
        assert!(matches!(bad(f64::NAN, 180.0, 0.25), Err(ModelError::InvalidConfiguration(_))));
    }
}
