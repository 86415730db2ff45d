//! Conductive freeze-thaw soil column
//!
//! Heat conduction through a column of soil cells driven by the ground surface
//! temperature. Cells below freezing hold part of their moisture as ice, which is
//! reported to the runoff model in the form its surface scheme expects.

use crate::clock::ModelClock;
use hydrocouple_core::config_file::KeyValueConfig;
use hydrocouple_core::errors::{CouplingError, CouplingResult};
use hydrocouple_core::handle::{unknown_variable, FreezeThawHandle, Lifecycle, ModelHandle};
use hydrocouple_core::scheme::RunoffScheme;
use hydrocouple_core::standard_variables::*;
use hydrocouple_core::value::{FloatValue, Time, VariableValue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const NAME: &str = "FreezeThawColumn";

/// Freezing point of soil water
/// unit: K
const FREEZING_POINT: FloatValue = 273.15;

/// Parameters for the freeze-thaw column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeThawParameters {
    /// Depth of the bottom of each cell
    /// unit: m
    pub soil_z: Vec<FloatValue>,
    /// Porosity, the largest volumetric moisture a cell can hold
    pub smcmax: FloatValue,
    /// unit: m2 s-1
    pub thermal_diffusivity: FloatValue,
    /// Temperature range below freezing over which a cell goes from thawed to frozen
    /// unit: K
    pub freezing_range: FloatValue,
}

impl Default for FreezeThawParameters {
    fn default() -> Self {
        Self {
            soil_z: vec![0.1, 0.3, 1.0, 2.0],
            smcmax: 0.4,
            thermal_diffusivity: 5e-7,
            freezing_range: 1.0,
        }
    }
}

impl FreezeThawParameters {
    pub fn from_config(config: &KeyValueConfig) -> CouplingResult<Self> {
        let defaults = Self::default();
        let parameters = Self {
            soil_z: config.parse_list("soil_z")?.unwrap_or(defaults.soil_z),
            smcmax: config.parse_or("smcmax", defaults.smcmax)?,
            thermal_diffusivity: config
                .parse_or("thermal_diffusivity", defaults.thermal_diffusivity)?,
            freezing_range: config.parse_or("freezing_range", defaults.freezing_range)?,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    fn validate(&self) -> CouplingResult<()> {
        if self.soil_z.is_empty() {
            return Err(CouplingError::Config("soil_z must list at least one cell".into()));
        }
        let mut top = 0.0;
        for bottom in &self.soil_z {
            if *bottom <= top {
                return Err(CouplingError::Config(
                    "soil_z must be positive and strictly increasing".into(),
                ));
            }
            top = *bottom;
        }
        if self.thermal_diffusivity <= 0.0 || self.freezing_range <= 0.0 {
            return Err(CouplingError::Config(
                "thermal_diffusivity and freezing_range must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Thickness of each cell
    pub fn thicknesses(&self) -> Vec<FloatValue> {
        let mut top = 0.0;
        self.soil_z
            .iter()
            .map(|bottom| {
                let dz = bottom - top;
                top = *bottom;
                dz
            })
            .collect()
    }

    /// Depth of the centre of each cell
    pub fn centres(&self) -> Vec<FloatValue> {
        let mut top = 0.0;
        self.soil_z
            .iter()
            .map(|bottom| {
                let centre = 0.5 * (top + bottom);
                top = *bottom;
                centre
            })
            .collect()
    }
}

/// Soil column with explicit heat conduction
///
/// $$ \frac{\partial T}{\partial t} = D \frac{\partial^2 T}{\partial z^2} $$
///
/// The surface is held at the ground temperature and the base is insulated.
/// The model step is split into sub-steps short enough for the explicit scheme to be stable.
#[derive(Debug, Default)]
pub struct FreezeThawColumn {
    parameters: FreezeThawParameters,
    lifecycle: Lifecycle,
    clock: ModelClock,
    /// Runoff scheme whose ice fraction is produced. Both are produced when unset.
    scheme: Option<RunoffScheme>,
    /// The scheme code exactly as it was last set
    scheme_value: Option<VariableValue>,

    /// unit: K
    ground_temperature: FloatValue,
    /// unit: K
    soil_temperature: Vec<FloatValue>,
    soil_moisture: Vec<FloatValue>,
    /// Frozen fraction of each cell's moisture
    frozen_fraction: Vec<FloatValue>,
    ice_fraction_schaake: FloatValue,
    ice_fraction_xinanjiang: FloatValue,
}

impl FreezeThawColumn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a column with uniform initial temperature and moisture
    pub fn from_parameters(
        parameters: FreezeThawParameters,
        clock: ModelClock,
        temperature: FloatValue,
        moisture: FloatValue,
    ) -> Self {
        let cells = parameters.soil_z.len();
        let mut column = Self {
            parameters,
            clock,
            ground_temperature: temperature,
            soil_temperature: vec![temperature; cells],
            soil_moisture: vec![moisture; cells],
            frozen_fraction: vec![0.0; cells],
            ..Self::default()
        };
        column.update_ice();
        column
    }

    pub fn num_cells(&self) -> usize {
        self.parameters.soil_z.len()
    }

    pub fn soil_temperature(&self) -> &[FloatValue] {
        &self.soil_temperature
    }

    pub fn frozen_fraction(&self) -> &[FloatValue] {
        &self.frozen_fraction
    }

    /// Frozen water in the whole column
    /// unit: m
    pub fn ice_content(&self) -> FloatValue {
        self.parameters
            .thicknesses()
            .iter()
            .zip(&self.frozen_fraction)
            .zip(&self.soil_moisture)
            .map(|((dz, frozen), moisture)| dz * frozen * moisture)
            .sum()
    }

    /// Frozen fraction of the top cell
    pub fn surface_frozen_fraction(&self) -> FloatValue {
        self.frozen_fraction.first().copied().unwrap_or(0.0)
    }

    /// Conduct heat through the column over `duration` seconds
    pub fn conduct(&mut self, duration: Time) {
        let diffusivity = self.parameters.thermal_diffusivity;
        let thicknesses = self.parameters.thicknesses();
        let centres = self.parameters.centres();

        let thinnest = thicknesses.iter().copied().fold(FloatValue::MAX, FloatValue::min);
        let stable = 0.2 * thinnest * thinnest / diffusivity;
        let substeps = (duration / stable).ceil().max(1.0) as usize;
        let dt = duration / substeps as FloatValue;

        let cells = self.soil_temperature.len();
        let mut flux = vec![0.0; cells + 1];
        for _ in 0..substeps {
            // flux[i] is the downward heat flux through the top of cell i
            flux[0] = diffusivity * (self.ground_temperature - self.soil_temperature[0]) / centres[0];
            for i in 1..cells {
                flux[i] = diffusivity * (self.soil_temperature[i - 1] - self.soil_temperature[i])
                    / (centres[i] - centres[i - 1]);
            }
            flux[cells] = 0.0;

            for i in 0..cells {
                self.soil_temperature[i] += dt * (flux[i] - flux[i + 1]) / thicknesses[i];
            }
        }
    }

    fn update_ice(&mut self) {
        let range = self.parameters.freezing_range;
        self.frozen_fraction = self
            .soil_temperature
            .iter()
            .map(|temperature| ((FREEZING_POINT - temperature) / range).clamp(0.0, 1.0))
            .collect();

        let (schaake, xinanjiang) = match self.scheme {
            Some(RunoffScheme::Schaake) => (self.ice_content(), 0.0),
            Some(RunoffScheme::Xinanjiang) => (0.0, self.surface_frozen_fraction()),
            None => (self.ice_content(), self.surface_frozen_fraction()),
        };
        self.ice_fraction_schaake = schaake;
        self.ice_fraction_xinanjiang = xinanjiang;
    }

    fn set_scheme(&mut self, value: &VariableValue) -> CouplingResult<()> {
        let code = match value {
            VariableValue::Scalar(code) if code.fract() == 0.0 && code.is_finite() => {
                *code as i64
            }
            other => other.expect_integer(NAME, VAR_ICE_FRACTION_SCHEME.name)?,
        };
        self.scheme = Some(RunoffScheme::try_from(code)?);
        self.scheme_value = Some(value.clone());
        self.update_ice();
        Ok(())
    }
}

impl ModelHandle for FreezeThawColumn {
    fn component_name(&self) -> &str {
        NAME
    }

    fn initialize(&mut self, config_file: &Path) -> CouplingResult<()> {
        self.lifecycle.initialize(NAME)?;
        let config = KeyValueConfig::from_path(config_file)?;
        let parameters = FreezeThawParameters::from_config(&config)?;

        config.require("end_time")?;
        let clock = ModelClock::from_config(&config, "time_step", "end_time", 3600.0)?;
        let temperature = config.parse_or("soil_temperature", FREEZING_POINT + 2.0)?;
        let moisture = config.parse_or("soil_moisture", 0.5 * parameters.smcmax)?;

        let scheme = match config.get("ice_fraction_scheme") {
            Some("Schaake") => Some(RunoffScheme::Schaake),
            Some("Xinanjiang") => Some(RunoffScheme::Xinanjiang),
            Some(other) => {
                return Err(CouplingError::Config(format!(
                    "unknown ice_fraction_scheme '{}'",
                    other
                )))
            }
            None => None,
        };

        *self = Self {
            lifecycle: self.lifecycle,
            scheme,
            scheme_value: scheme.map(|scheme| VariableValue::Integer(scheme.code())),
            ..Self::from_parameters(parameters, clock, temperature, moisture)
        };
        self.update_ice();
        Ok(())
    }

    fn update(&mut self) -> CouplingResult<()> {
        self.lifecycle.ensure_active(NAME, "update")?;
        self.conduct(self.clock.time_step);
        self.update_ice();
        debug!(
            ground_temperature = self.ground_temperature,
            ice_content = self.ice_content(),
            surface_frozen_fraction = self.surface_frozen_fraction(),
            "Freeze-thaw step"
        );
        self.clock.advance();
        Ok(())
    }

    fn get_value(&self, key: &str) -> CouplingResult<VariableValue> {
        let value = match key {
            k if k == VAR_ICE_FRACTION_SCHAAKE.name => {
                VariableValue::Scalar(self.ice_fraction_schaake)
            }
            k if k == VAR_ICE_FRACTION_XINANJIANG.name => {
                VariableValue::Scalar(self.ice_fraction_xinanjiang)
            }
            k if k == VAR_NUM_CELLS.name => VariableValue::Integer(self.num_cells() as i64),
            k if k == VAR_SOIL_TEMPERATURE_PROFILE.name => {
                VariableValue::Vector(self.soil_temperature.clone())
            }
            k if k == VAR_GROUND_TEMPERATURE.name => VariableValue::Scalar(self.ground_temperature),
            k if k == VAR_SOIL_MOISTURE_PROFILE.name => {
                VariableValue::Vector(self.soil_moisture.clone())
            }
            k if k == VAR_ICE_FRACTION_SCHEME.name => self
                .scheme_value
                .clone()
                .unwrap_or(VariableValue::Integer(0)),
            _ => return Err(unknown_variable(NAME, key)),
        };
        Ok(value)
    }

    fn set_value(&mut self, key: &str, value: VariableValue) -> CouplingResult<()> {
        match key {
            k if k == VAR_GROUND_TEMPERATURE.name => {
                self.ground_temperature = value.expect_scalar(NAME, key)?;
            }
            k if k == VAR_SOIL_MOISTURE_PROFILE.name => {
                let profile = value.expect_vector(NAME, key)?;
                if profile.len() != self.num_cells() {
                    return Err(CouplingError::LengthMismatch {
                        key: key.to_string(),
                        expected: self.num_cells(),
                        found: profile.len(),
                    });
                }
                self.soil_moisture = profile.to_vec();
            }
            k if k == VAR_ICE_FRACTION_SCHEME.name => self.set_scheme(&value)?,
            _ => return Err(unknown_variable(NAME, key)),
        }
        Ok(())
    }

    fn input_names(&self) -> Vec<String> {
        [
            &VAR_GROUND_TEMPERATURE,
            &VAR_SOIL_MOISTURE_PROFILE,
            &VAR_ICE_FRACTION_SCHEME,
        ]
        .iter()
        .map(|var| var.name.to_string())
        .collect()
    }

    fn output_names(&self) -> Vec<String> {
        [
            &VAR_ICE_FRACTION_SCHAAKE,
            &VAR_ICE_FRACTION_XINANJIANG,
            &VAR_NUM_CELLS,
            &VAR_SOIL_TEMPERATURE_PROFILE,
        ]
        .iter()
        .map(|var| var.name.to_string())
        .collect()
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

impl FreezeThawHandle for FreezeThawColumn {}
