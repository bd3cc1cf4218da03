//! Power and derating.
//!
//! The plant area is derived from installed capacity and a reference module:
//!   module specific power [kW/m²] = P_nom / A_nom / 1000
//!   A [m²] = P_installed / module specific power
//! then P [kW] = A · η · G_poa / 1000, and the derating chain multiplies in.

use crate::error::{ModelError, Result};
use crate::models::pv::{DeratingFactors, PowerOutput, PowerParameters};

pub struct PowerModel {
    total_area_m2: f64,
    factors: Vec<f64>,
    derating_product: f64,
}

impl PowerModel {
    pub fn new(params: &PowerParameters, derating: &DeratingFactors) -> Result<Self> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(v)
            } else {
                Err(ModelError::config(format!("{name} must be > 0, got {v}")))
            }
        };
        let capacity = positive("installed capacity", params.installed_capacity_kw)?;
        let rated = positive("module rated power", params.rated_power_wp)?;
        let area = positive("module area", params.module_area_m2)?;

        for d in derating.iter() {
            if !(d.factor > 0.0 && d.factor <= 1.0) {
                return Err(ModelError::config(format!(
                    "derating factor '{}' = {} outside (0, 1]",
                    d.name, d.factor
                )));
            }
        }

        let module_specific_power = rated / area / 1000.0;
        Ok(Self {
            total_area_m2: capacity / module_specific_power,
            factors: derating.iter().map(|d| d.factor).collect(),
            derating_product: derating.product(),
        })
    }

    /// Module area needed to reach the installed capacity (m²).
    pub fn total_area_m2(&self) -> f64 {
        self.total_area_m2
    }

    pub fn derating_product(&self) -> f64 {
        self.derating_product
    }

    /// Electrical output per square metre of module (kW/m²), independent of
    /// plant size.
    pub fn specific_power(efficiency: f64, poa_global: f64) -> f64 {
        efficiency * poa_global / 1000.0
    }

    /// Running product of the derating chain applied to `power`, one entry
    /// per factor.
    pub fn derating_steps(&self, power: f64) -> Vec<f64> {
        self.factors
            .iter()
            .scan(power, |acc, f| {
                *acc *= f;
                Some(*acc)
            })
            .collect()
    }

    pub fn output(&self, efficiency: f64, poa_global: f64) -> PowerOutput {
        let specific_power = Self::specific_power(efficiency, poa_global);
        let power = self.total_area_m2 * specific_power;
        PowerOutput {
            specific_power,
            derated_specific_power: specific_power * self.derating_product,
            power,
            derated_power: power * self.derating_product,
            derating_steps: self.derating_steps(power),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pv::DeratingFactor;

    fn reference() -> PowerModel {
        PowerModel::new(&PowerParameters::default(), &DeratingFactors::default()).unwrap()
    }

    #[test]
    fn test_area_of_one_megawatt_plant() {
        // 1000 kW / (320 / 1.971102 / 1000) kW/m²
        let expected = 1000.0 / (320.0 / (1.983 * 0.994) / 1000.0);
        assert!((reference().total_area_m2() - expected).abs() < 1e-9);
        assert!((expected - 6159.69).abs() < 0.01);
    }

    #[test]
    fn test_power_at_stc_equals_capacity_times_efficiency_ratio() {
        let m = reference();
        let module_eta = 320.0 / (1.983 * 0.994) / 1000.0;
        let out = m.output(module_eta, 1000.0);
        assert!((out.power - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_derating_chain() {
        let m = reference();
        let out = m.output(0.16, 850.0);
        assert_eq!(out.derating_steps.len(), 2);
        assert!((out.derating_steps[0] - out.power * 0.9).abs() < 1e-9);
        assert!((out.derating_steps[1] - out.power * 0.9 * 0.934).abs() < 1e-9);
        assert!((out.derating_steps[1] - out.derated_power).abs() < 1e-9);
        assert!(out.derated_power < out.power);
        assert!((out.derated_specific_power - out.specific_power * 0.9 * 0.934).abs() < 1e-15);
    }

    #[test]
    fn test_unit_factors_leave_power_unchanged() {
        let chain = DeratingFactors(vec![DeratingFactor::new("wave_induced", 1.0), DeratingFactor::new("humidity", 1.0)]);
        let m = PowerModel::new(&PowerParameters::default(), &chain).unwrap();
        let out = m.output(0.15, 640.0);
        assert_eq!(out.derated_power, out.power);
        assert_eq!(out.derated_specific_power, out.specific_power);
    }

    #[test]
    fn test_specific_power_is_size_independent() {
        let small = PowerModel::new(
            &PowerParameters { installed_capacity_kw: 10.0, ..PowerParameters::default() },
            &DeratingFactors::default(),
        )
        .unwrap();
        let a = small.output(0.15, 700.0);
        let b = reference().output(0.15, 700.0);
        assert_eq!(a.specific_power, b.specific_power);
        assert!((b.power / a.power - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_positive_sizes() {
        let d = PowerParameters::default();
        let chain = DeratingFactors::default();
        for p in [
            PowerParameters { installed_capacity_kw: 0.0, ..d.clone() },
            PowerParameters { rated_power_wp: -320.0, ..d.clone() },
            PowerParameters { module_area_m2: 0.0, ..d.clone() },
        ] {
            assert!(matches!(PowerModel::new(&p, &chain), Err(ModelError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_rejects_factor_outside_unit_interval() {
        for f in [0.0, 1.01, f64::NAN] {
            let chain = DeratingFactors(vec![DeratingFactor::new("humidity", f)]);
            assert!(PowerModel::new(&PowerParameters::default(), &chain).is_err(), "factor {f}");
        }
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let m = PowerModel::new(&PowerParameters::default(), &DeratingFactors(Vec::new())).unwrap();
        let out = m.output(0.16, 500.0);
        assert!(out.derating_steps.is_empty());
        assert_eq!(out.derated_power, out.power);
    }
}
