//! Soil moisture profile generator
//!
//! Maps the runoff model's bulk soil storage onto the cells of the freeze-thaw column.

use crate::clock::ModelClock;
use hydrocouple_core::config::SOIL_MOISTURE_LAYERS;
use hydrocouple_core::config_file::KeyValueConfig;
use hydrocouple_core::errors::{CouplingError, CouplingResult};
use hydrocouple_core::handle::{unknown_variable, Lifecycle, ModelHandle};
use hydrocouple_core::scheme::SoilMoistureMethod;
use hydrocouple_core::standard_variables::*;
use hydrocouple_core::value::{FloatValue, Time, VariableValue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const NAME: &str = "SoilMoistureProfile";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilMoistureProfileParameters {
    /// Depth of the bottom of each cell in the output profile
    /// unit: m
    pub soil_z: Vec<FloatValue>,
    pub smcmax: FloatValue,
    pub method: SoilMoistureMethod,
    /// Depth of the runoff model's soil reservoir
    /// unit: m
    pub storage_depth: FloatValue,
    /// Depth of the bottom of each conceptual layer
    /// unit: m
    pub layer_z: [FloatValue; SOIL_MOISTURE_LAYERS],
}

impl Default for SoilMoistureProfileParameters {
    fn default() -> Self {
        Self {
            soil_z: vec![0.1, 0.3, 1.0, 2.0],
            smcmax: 0.4,
            method: SoilMoistureMethod::Constant,
            storage_depth: 2.0,
            layer_z: [0.1, 0.4, 1.0, 2.0],
        }
    }
}

impl SoilMoistureProfileParameters {
    pub fn from_config(config: &KeyValueConfig) -> CouplingResult<Self> {
        let defaults = Self::default();
        let soil_z = config.parse_list("soil_z")?.unwrap_or(defaults.soil_z);
        let storage_depth = config.parse_or(
            "soil_storage_depth",
            soil_z.last().copied().unwrap_or(defaults.storage_depth),
        )?;
        let layer_z = match config.parse_list("soil_layer_z")? {
            Some(layers) => <[FloatValue; SOIL_MOISTURE_LAYERS]>::try_from(layers.as_slice())
                .map_err(|_| {
                    CouplingError::Config(format!(
                        "soil_layer_z must list {} depths",
                        SOIL_MOISTURE_LAYERS
                    ))
                })?,
            None => defaults.layer_z,
        };

        let parameters = Self {
            soil_z,
            smcmax: config.parse_or("smcmax", defaults.smcmax)?,
            method: match config.get("soil_storage_model") {
                Some(raw) => parse_method(raw)?,
                None => defaults.method,
            },
            storage_depth,
            layer_z,
        };

        if parameters.soil_z.is_empty() {
            return Err(CouplingError::Config(
                "soil_z must list at least one cell".to_string(),
            ));
        }
        if parameters.storage_depth <= 0.0 {
            return Err(CouplingError::Config(
                "soil_storage_depth must be positive".to_string(),
            ));
        }
        Ok(parameters)
    }
}

fn parse_method(raw: &str) -> CouplingResult<SoilMoistureMethod> {
    match raw {
        "constant" => Ok(SoilMoistureMethod::Constant),
        "layered" => Ok(SoilMoistureMethod::Layered),
        other => {
            let code = other.parse::<i64>().map_err(|_| {
                CouplingError::Config(format!("unknown soil_storage_model '{}'", other))
            })?;
            SoilMoistureMethod::try_from(code)
        }
    }
}

/// Centre depth of each interval bounded by the listed bottom depths
fn centres(bottoms: &[FloatValue]) -> Vec<FloatValue> {
    let mut top = 0.0;
    bottoms
        .iter()
        .map(|bottom| {
            let centre = 0.5 * (top + bottom);
            top = *bottom;
            centre
        })
        .collect()
}

/// Linear interpolation, held constant beyond the first and last points
fn interpolate(x: FloatValue, xs: &[FloatValue], ys: &[FloatValue]) -> FloatValue {
    if x <= xs[0] {
        return ys[0];
    }
    for i in 1..xs.len() {
        if x <= xs[i] {
            let weight = (x - xs[i - 1]) / (xs[i] - xs[i - 1]);
            return ys[i - 1] + weight * (ys[i] - ys[i - 1]);
        }
    }
    ys[ys.len() - 1]
}

/// Volumetric soil moisture of each cell
///
/// With the constant method every cell holds the bulk storage spread over the reservoir depth.
/// With the layered method the moisture of the conceptual layers is interpolated
/// linearly between layer centres.
#[derive(Debug, Default)]
pub struct SoilMoistureProfile {
    parameters: SoilMoistureProfileParameters,
    lifecycle: Lifecycle,
    clock: ModelClock,

    /// unit: m
    soil_storage: FloatValue,
    /// unit: m
    soil_storage_change: FloatValue,
    layered: Option<[FloatValue; SOIL_MOISTURE_LAYERS]>,
    profile: Vec<FloatValue>,
}

impl SoilMoistureProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parameters(parameters: SoilMoistureProfileParameters) -> Self {
        let profile = vec![0.0; parameters.soil_z.len()];
        Self {
            parameters,
            profile,
            ..Self::default()
        }
    }

    pub fn profile(&self) -> &[FloatValue] {
        &self.profile
    }

    /// Profile derived from the current inputs
    ///
    /// Fails if the layered method is selected and no layer moisture has been set.
    pub fn calculate_profile(&self) -> CouplingResult<Vec<FloatValue>> {
        let p = &self.parameters;
        let profile = match p.method {
            SoilMoistureMethod::Constant => {
                let moisture = (self.soil_storage / p.storage_depth).clamp(0.0, p.smcmax);
                vec![moisture; p.soil_z.len()]
            }
            SoilMoistureMethod::Layered => {
                let layered = self.layered.ok_or_else(|| {
                    CouplingError::Error(format!(
                        "{} requires {} before a layered update",
                        NAME, VAR_SOIL_MOISTURE_LAYERED.name
                    ))
                })?;
                let layer_centres = centres(&p.layer_z);
                centres(&p.soil_z)
                    .iter()
                    .map(|depth| {
                        interpolate(*depth, &layer_centres, &layered).clamp(0.0, p.smcmax)
                    })
                    .collect()
            }
        };
        Ok(profile)
    }
}

impl ModelHandle for SoilMoistureProfile {
    fn component_name(&self) -> &str {
        NAME
    }

    fn initialize(&mut self, config_file: &Path) -> CouplingResult<()> {
        self.lifecycle.initialize(NAME)?;
        let config = KeyValueConfig::from_path(config_file)?;
        let parameters = SoilMoistureProfileParameters::from_config(&config)?;
        let clock = ModelClock::from_config(&config, "time_step", "end_time", 3600.0)?;

        *self = Self {
            lifecycle: self.lifecycle,
            clock,
            ..Self::from_parameters(parameters)
        };
        Ok(())
    }

    fn update(&mut self) -> CouplingResult<()> {
        self.lifecycle.ensure_active(NAME, "update")?;
        self.profile = self.calculate_profile()?;
        debug!(
            method = %self.parameters.method,
            soil_storage = self.soil_storage,
            soil_storage_change = self.soil_storage_change,
            "Soil moisture profile {:?}",
            self.profile
        );
        self.clock.advance();
        Ok(())
    }

    fn get_value(&self, key: &str) -> CouplingResult<VariableValue> {
        let value = match key {
            k if k == VAR_SOIL_MOISTURE_PROFILE.name => VariableValue::Vector(self.profile.clone()),
            k if k == VAR_SOIL_MOISTURE_METHOD.name => {
                VariableValue::Integer(self.parameters.method.code())
            }
            k if k == VAR_SOIL_STORAGE_SMP.name => VariableValue::Scalar(self.soil_storage),
            k if k == VAR_SOIL_STORAGE_CHANGE_SMP.name => {
                VariableValue::Scalar(self.soil_storage_change)
            }
            k if k == VAR_SOIL_MOISTURE_LAYERED.name => match self.layered {
                Some(layered) => VariableValue::Vector(layered.to_vec()),
                None => VariableValue::Vector(Vec::new()),
            },
            _ => return Err(unknown_variable(NAME, key)),
        };
        Ok(value)
    }

    fn set_value(&mut self, key: &str, value: VariableValue) -> CouplingResult<()> {
        match key {
            k if k == VAR_SOIL_STORAGE_SMP.name => {
                self.soil_storage = value.expect_scalar(NAME, key)?;
            }
            k if k == VAR_SOIL_STORAGE_CHANGE_SMP.name => {
                self.soil_storage_change = value.expect_scalar(NAME, key)?;
            }
            k if k == VAR_SOIL_MOISTURE_LAYERED.name => {
                let layers = value.expect_vector(NAME, key)?;
                let layered = <[FloatValue; SOIL_MOISTURE_LAYERS]>::try_from(layers).map_err(|_| {
                    CouplingError::LengthMismatch {
                        key: key.to_string(),
                        expected: SOIL_MOISTURE_LAYERS,
                        found: layers.len(),
                    }
                })?;
                self.layered = Some(layered);
            }
            _ => return Err(unknown_variable(NAME, key)),
        }
        Ok(())
    }

    fn input_names(&self) -> Vec<String> {
        [
            &VAR_SOIL_STORAGE_SMP,
            &VAR_SOIL_STORAGE_CHANGE_SMP,
            &VAR_SOIL_MOISTURE_LAYERED,
        ]
        .iter()
        .map(|var| var.name.to_string())
        .collect()
    }

    fn output_names(&self) -> Vec<String> {
        vec![
            VAR_SOIL_MOISTURE_PROFILE.name.to_string(),
            VAR_SOIL_MOISTURE_METHOD.name.to_string(),
        ]
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
