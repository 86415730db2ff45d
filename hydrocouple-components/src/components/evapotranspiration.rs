//! Potential evapotranspiration using the Priestley-Taylor method.

use crate::clock::ModelClock;
use hydrocouple_core::config_file::KeyValueConfig;
use hydrocouple_core::errors::CouplingResult;
use hydrocouple_core::handle::{unknown_variable, Lifecycle, ModelHandle};
use hydrocouple_core::standard_variables::*;
use hydrocouple_core::value::{FloatValue, Time, VariableValue};
use hydrocouple_core::variable::VariableDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const NAME: &str = "PriestleyTaylor";

/// Stefan-Boltzmann constant
/// unit: W m-2 K-4
const STEFAN_BOLTZMANN: FloatValue = 5.670374e-8;
/// Density of liquid water
/// unit: kg m-3
const WATER_DENSITY: FloatValue = 1000.0;

/// Parameters for the Priestley-Taylor model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriestleyTaylorParameters {
    /// Priestley-Taylor coefficient
    pub alpha: FloatValue,
    /// Surface shortwave albedo
    pub albedo: FloatValue,
    /// Surface longwave emissivity
    pub emissivity: FloatValue,
}

impl Default for PriestleyTaylorParameters {
    fn default() -> Self {
        Self {
            alpha: 1.26,
            albedo: 0.23,
            emissivity: 0.97,
        }
    }
}

impl PriestleyTaylorParameters {
    /// Read parameters from a model configuration, falling back to defaults
    pub fn from_config(config: &KeyValueConfig) -> CouplingResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            alpha: config.parse_or("priestley_taylor_alpha", defaults.alpha)?,
            albedo: config.parse_or("shortwave_albedo", defaults.albedo)?,
            emissivity: config.parse_or("longwave_emissivity", defaults.emissivity)?,
        })
    }
}

/// Priestley-Taylor potential evapotranspiration
///
/// $$ PET = \alpha \frac{\Delta}{\Delta + \gamma} \frac{R_n}{\lambda \rho_w} $$
///
/// Where:
/// - $R_n$ is the net radiation at the surface, with ground heat flux neglected
/// - $\Delta$ is the slope of the saturation vapour pressure curve
/// - $\gamma$ is the psychrometric constant
/// - $\lambda$ is the latent heat of vaporisation
#[derive(Debug, Default)]
pub struct PriestleyTaylor {
    parameters: PriestleyTaylorParameters,
    lifecycle: Lifecycle,
    clock: ModelClock,
    inputs: HashMap<&'static str, FloatValue>,
    potential_evapotranspiration: FloatValue,
}

impl PriestleyTaylor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parameters(parameters: PriestleyTaylorParameters) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    fn input(&self, var: &VariableDefinition) -> FloatValue {
        self.inputs.get(var.name).copied().unwrap_or(0.0)
    }

    /// Potential evapotranspiration in m s-1
    ///
    /// Temperature in K, pressure in Pa and radiation in W m-2.
    pub fn calculate_pet(
        &self,
        air_temperature: FloatValue,
        air_pressure: FloatValue,
        shortwave: FloatValue,
        longwave: FloatValue,
    ) -> FloatValue {
        let p = &self.parameters;
        let celsius = air_temperature - 273.15;

        let net_radiation = (1.0 - p.albedo) * shortwave + p.emissivity * longwave
            - p.emissivity * STEFAN_BOLTZMANN * air_temperature.powi(4);
        if net_radiation <= 0.0 {
            return 0.0;
        }

        // kPa
        let saturation = 0.6108 * (17.27 * celsius / (celsius + 237.3)).exp();
        // kPa K-1
        let slope = 4098.0 * saturation / (celsius + 237.3).powi(2);
        let psychrometric = 0.000665 * air_pressure / 1000.0;
        // J kg-1
        let latent_heat = 2.501e6 - 2361.0 * celsius;

        p.alpha * slope / (slope + psychrometric) * net_radiation / (latent_heat * WATER_DENSITY)
    }
}

impl ModelHandle for PriestleyTaylor {
    fn component_name(&self) -> &str {
        NAME
    }

    fn initialize(&mut self, config_file: &Path) -> CouplingResult<()> {
        self.lifecycle.initialize(NAME)?;
        let config = KeyValueConfig::from_path(config_file)?;
        self.parameters = PriestleyTaylorParameters::from_config(&config)?;
        self.clock = ModelClock::from_config(&config, "time_step", "end_time", 3600.0)?;
        Ok(())
    }

    fn update(&mut self) -> CouplingResult<()> {
        self.lifecycle.ensure_active(NAME, "update")?;
        self.potential_evapotranspiration = self.calculate_pet(
            self.input(&VAR_AIR_TEMPERATURE),
            self.input(&VAR_AIR_PRESSURE),
            self.input(&VAR_SHORTWAVE_RADIATION),
            self.input(&VAR_LONGWAVE_RADIATION),
        );
        self.clock.advance();
        Ok(())
    }

    fn get_value(&self, key: &str) -> CouplingResult<VariableValue> {
        if key == VAR_POTENTIAL_ET.name {
            return Ok(VariableValue::Scalar(self.potential_evapotranspiration));
        }
        match MET_FORCING_VARIABLES.iter().find(|var| var.name == key) {
            Some(var) => Ok(VariableValue::Scalar(self.input(var))),
            None => Err(unknown_variable(NAME, key)),
        }
    }

    fn set_value(&mut self, key: &str, value: VariableValue) -> CouplingResult<()> {
        let var = MET_FORCING_VARIABLES
            .iter()
            .find(|var| var.name == key)
            .ok_or_else(|| unknown_variable(NAME, key))?;
        self.inputs
            .insert(var.name, value.expect_scalar(NAME, key)?);
        Ok(())
    }

    fn input_names(&self) -> Vec<String> {
        MET_FORCING_VARIABLES
            .iter()
            .map(|var| var.name.to_string())
            .collect()
    }

    fn output_names(&self) -> Vec<String> {
        vec![VAR_POTENTIAL_ET.name.to_string()]
    }

    fn current_time(&self) -> Time {
        self.clock.current_time
    }

    fn time_step(&self) -> Time {
        self.clock.time_step
    }

    fn end_time(&self) -> Time {
        self.clock.end_time
    }

    fn finalize(&mut self) -> CouplingResult<()> {
        self.lifecycle.finalize(NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_no_evaporation_without_energy() {
        let model = PriestleyTaylor::new();
        assert_eq!(model.calculate_pet(263.15, 101325.0, 0.0, 200.0), 0.0);
    }

    #[test]
    fn test_summer_midday() {
        let model = PriestleyTaylor::new();
        // About 0.7 mm per hour under strong sunshine
        let pet = model.calculate_pet(298.15, 101325.0, 800.0, 350.0);
        let mm_per_hour = pet * 1000.0 * 3600.0;
        assert!(mm_per_hour > 0.4 && mm_per_hour < 0.8, "{}", mm_per_hour);
    }

    #[test]
    fn test_alpha_scales_linearly() {
        let base = PriestleyTaylor::new().calculate_pet(293.15, 101325.0, 500.0, 320.0);
        let doubled = PriestleyTaylor::from_parameters(PriestleyTaylorParameters {
            alpha: 2.52,
            ..PriestleyTaylorParameters::default()
        })
        .calculate_pet(293.15, 101325.0, 500.0, 320.0);
        assert_relative_eq!(doubled, 2.0 * base, max_relative = 1e-12);
    }

    #[test]
    fn test_inputs_round_trip() {
        let mut model = PriestleyTaylor::new();
        model
            .set_value(VAR_WIND_U.name, VariableValue::Scalar(2.5))
            .unwrap();
        assert_eq!(
            model.get_value(VAR_WIND_U.name).unwrap(),
            VariableValue::Scalar(2.5)
        );
        assert!(model
            .set_value(VAR_WIND_U.name, VariableValue::Integer(2))
            .is_err());
        assert!(model.set_value("wind_speed", 2.5.into()).is_err());
        assert!(model.accepts(VAR_RELATIVE_HUMIDITY.name));
        assert!(model.provides(VAR_POTENTIAL_ET.name));
    }
}
