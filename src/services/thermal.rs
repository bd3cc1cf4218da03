//! Steady-state cell temperature (PVsyst / Faiman form).
//!
//! T_cell = T_air + G_poa · α · (1 − η_m) / (U_c + U_v · v_wind)
//!
//! With the default α = 1 and η_m = 0 the heat input is the plain POA
//! irradiance. There is no thermal mass: the cell follows the hour's inputs
//! instantly.

use crate::error::{ModelError, Result};
use crate::models::pv::ThermalCoefficients;

pub struct CellThermalModel {
    coefficients: ThermalCoefficients,
    heat_input_factor: f64,
}

impl CellThermalModel {
    pub fn new(coefficients: &ThermalCoefficients) -> Result<Self> {
        let ThermalCoefficients { u_c, u_v, absorptance, module_efficiency } = *coefficients;
        if !u_c.is_finite() || u_c <= 0.0 {
            return Err(ModelError::config(format!("u_c must be > 0, got {u_c}")));
        }
        if !u_v.is_finite() || u_v < 0.0 {
            return Err(ModelError::config(format!("u_v must be >= 0, got {u_v}")));
        }
        if !(0.0..=1.0).contains(&absorptance) {
            return Err(ModelError::config(format!("absorptance {absorptance} outside [0, 1]")));
        }
        if !(0.0..1.0).contains(&module_efficiency) {
            return Err(ModelError::config(format!(
                "module efficiency {module_efficiency} outside [0, 1)"
            )));
        }
        Ok(Self {
            coefficients: coefficients.clone(),
            heat_input_factor: absorptance * (1.0 - module_efficiency),
        })
    }

    /// Rejects a physically meaningless wind speed. NaN is let through and
    /// propagates into the cell temperature.
    pub fn check_wind_speed(row: usize, wind_speed: f64) -> Result<()> {
        if wind_speed < 0.0 {
            return Err(ModelError::InvalidInput {
                row,
                message: format!("negative wind speed {wind_speed} m/s"),
            });
        }
        Ok(())
    }

    /// Combined heat-loss factor for a wind speed, W/(m²·K).
    pub fn loss_factor(&self, wind_speed: f64) -> f64 {
        self.coefficients.u_c + self.coefficients.u_v * wind_speed
    }

    /// Cell temperature in °C. The caller is expected to have checked the
    /// wind speed with [`Self::check_wind_speed`].
    pub fn cell_temperature(&self, poa_global: f64, air_temp: f64, wind_speed: f64) -> f64 {
        air_temp + poa_global * self.heat_input_factor / self.loss_factor(wind_speed)
    }
}
