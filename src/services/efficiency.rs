use crate::error::{ModelError, Result};
use crate::models::pv::EfficiencyParameters;

/// Linear temperature correction of the STC efficiency:
/// η = η_stc · (1 − γ · (T_cell − T_stc)).
///
/// The result is not clamped. Extreme cell temperatures can push it below
/// zero or above η_stc; bounding it is up to the caller so that anomalous
/// inputs stay visible.
pub struct EfficiencyModel {
    params: EfficiencyParameters,
}

impl EfficiencyModel {
    pub fn new(params: &EfficiencyParameters) -> Result<Self> {
        if !(params.eta_stc > 0.0 && params.eta_stc <= 1.0) {
            return Err(ModelError::config(format!("eta_stc {} outside (0, 1]", params.eta_stc)));
        }
        if !params.gamma.is_finite() || !params.t_ref_stc.is_finite() {
            return Err(ModelError::config("gamma and t_ref_stc must be finite"));
        }
        Ok(Self { params: params.clone() })
    }

    pub fn efficiency(&self, cell_temp: f64) -> f64 {
        let EfficiencyParameters { eta_stc, gamma, t_ref_stc } = self.params;
        eta_stc * (1.0 - gamma * (cell_temp - t_ref_stc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reference() -> EfficiencyModel {
        EfficiencyModel::new(&EfficiencyParameters::default()).unwrap()
    }

    #[test]
    fn test_stc_temperature_gives_stc_efficiency() {
        assert_eq!(reference().efficiency(25.0), 0.1649);
    }

    #[rstest]
    #[case(50.0, 0.1649 * 0.9)]
    #[case(0.0, 0.1649 * 1.1)]
    #[case(45.0, 0.1649 * 0.92)]
    fn test_linear_law(#[case] cell_temp: f64, #[case] expected: f64) {
        assert!((reference().efficiency(cell_temp) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_hotter_is_less_efficient() {
        let m = reference();
        assert!(m.efficiency(60.0) < m.efficiency(40.0));
    }

    #[test]
    fn test_no_clamping_at_extremes() {
        let m = reference();
        assert!(m.efficiency(400.0) < 0.0);
        assert!(m.efficiency(-60.0) > 0.1649);
    }

    #[test]
    fn test_rejects_out_of_range_eta() {
        for eta_stc in [0.0, 1.2, f64::NAN] {
            let p = EfficiencyParameters { eta_stc, ..EfficiencyParameters::default() };
            assert!(matches!(EfficiencyModel::new(&p), Err(ModelError::InvalidConfiguration(_))));
        }
        let p = EfficiencyParameters { gamma: f64::INFINITY, ..EfficiencyParameters::default() };
        assert!(EfficiencyModel::new(&p).is_err());
    }
}
