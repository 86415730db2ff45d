//! Single reservoir rainfall-runoff model
//!
//! Precipitation is split into surface runoff and infiltration by either the Schaake
//! or the Xinanjiang scheme. Infiltrated water enters one soil reservoir which loses
//! water to actual evapotranspiration and to percolation out of its base.
//! Every flux is accumulated so that the water balance can be closed at the end of a run.

use crate::clock::ModelClock;
use hydrocouple_core::config_file::KeyValueConfig;
use hydrocouple_core::errors::{CouplingError, CouplingResult};
use hydrocouple_core::handle::{unknown_variable, Lifecycle, ModelHandle, RunoffHandle};
use hydrocouple_core::mass_balance::MassBalanceReport;
use hydrocouple_core::scheme::RunoffScheme;
use hydrocouple_core::standard_variables::*;
use hydrocouple_core::value::{FloatValue, Time, VariableValue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const NAME: &str = "BucketRunoff";

const SECONDS_PER_DAY: FloatValue = 86400.0;

/// Parameters for the bucket runoff model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRunoffParameters {
    /// Capacity of the soil reservoir
    /// unit: m
    pub max_storage: FloatValue,
    /// Initial storage as a fraction of capacity
    pub initial_storage_fraction: FloatValue,
    /// Fraction of storage lost to percolation per second
    /// unit: s-1
    pub percolation_rate: FloatValue,
    /// Schaake infiltration parameter
    /// unit: d-1
    pub schaake_kdt: FloatValue,
    /// Shape of the Xinanjiang storage capacity curve
    pub xinanjiang_shape: FloatValue,
    pub scheme: RunoffScheme,
    /// Largest mass balance residual treated as closed
    /// unit: m
    pub mass_balance_tolerance: FloatValue,
}

impl Default for BucketRunoffParameters {
    fn default() -> Self {
        Self {
            max_storage: 0.5,
            initial_storage_fraction: 0.5,
            percolation_rate: 1e-6,
            schaake_kdt: 3.0,
            xinanjiang_shape: 0.3,
            scheme: RunoffScheme::Schaake,
            mass_balance_tolerance: 1e-9,
        }
    }
}

impl BucketRunoffParameters {
    /// Read parameters from a model configuration, falling back to defaults
    pub fn from_config(config: &KeyValueConfig) -> CouplingResult<Self> {
        let defaults = Self::default();
        let parameters = Self {
            max_storage: config.parse_or("max_storage", defaults.max_storage)?,
            initial_storage_fraction: config
                .parse_or("initial_storage_fraction", defaults.initial_storage_fraction)?,
            percolation_rate: config.parse_or("percolation_rate", defaults.percolation_rate)?,
            schaake_kdt: config.parse_or("refkdt", defaults.schaake_kdt)?,
            xinanjiang_shape: config.parse_or("xinanjiang_shape", defaults.xinanjiang_shape)?,
            scheme: match config.get("surface_partitioning_scheme") {
                Some(raw) => parse_scheme(raw)?,
                None => defaults.scheme,
            },
            mass_balance_tolerance: config
                .parse_or("mass_balance_tolerance", defaults.mass_balance_tolerance)?,
        };

        if parameters.max_storage <= 0.0 {
            return Err(CouplingError::Config(
                "max_storage must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&parameters.initial_storage_fraction) {
            return Err(CouplingError::Config(
                "initial_storage_fraction must lie in [0, 1]".to_string(),
            ));
        }
        Ok(parameters)
    }
}

/// Accept the scheme by name or by code
fn parse_scheme(raw: &str) -> CouplingResult<RunoffScheme> {
    match raw {
        "Schaake" => Ok(RunoffScheme::Schaake),
        "Xinanjiang" => Ok(RunoffScheme::Xinanjiang),
        other => {
            let code = other.parse::<i64>().map_err(|_| {
                CouplingError::Config(format!("unknown surface_partitioning_scheme '{}'", other))
            })?;
            RunoffScheme::try_from(code)
        }
    }
}

/// Running totals of every flux, all in m
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct WaterBalance {
    precipitation: FloatValue,
    surface_runoff: FloatValue,
    evapotranspiration: FloatValue,
    percolation: FloatValue,
}

/// Single reservoir runoff model
#[derive(Debug, Default)]
pub struct BucketRunoff {
    parameters: BucketRunoffParameters,
    lifecycle: Lifecycle,
    clock: ModelClock,

    /// unit: mm s-1
    precipitation_rate: FloatValue,
    /// unit: m s-1
    potential_evapotranspiration: FloatValue,
    /// unit: m
    ice_fraction_schaake: FloatValue,
    ice_fraction_xinanjiang: FloatValue,

    /// unit: m
    storage: FloatValue,
    storage_initial: FloatValue,
    /// unit: m
    storage_change: FloatValue,
    /// Surface runoff over the last step
    /// unit: m
    surface_runoff: FloatValue,
    totals: WaterBalance,
}

impl BucketRunoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parameters(parameters: BucketRunoffParameters) -> Self {
        let storage = parameters.max_storage * parameters.initial_storage_fraction;
        Self {
            parameters,
            storage,
            storage_initial: storage,
            ..Self::default()
        }
    }

    pub fn parameters(&self) -> &BucketRunoffParameters {
        &self.parameters
    }

    pub fn storage(&self) -> FloatValue {
        self.storage
    }

    /// Surface runoff under the Schaake scheme
    ///
    /// Infiltration capacity shrinks with the storage deficit and with the depth of
    /// frozen water in the soil.
    pub fn schaake_runoff(
        &self,
        precipitation: FloatValue,
        storage: FloatValue,
        ice_content: FloatValue,
        time_step: Time,
    ) -> FloatValue {
        if precipitation <= 0.0 {
            return 0.0;
        }
        let p = &self.parameters;
        let deficit = (p.max_storage - storage).max(0.0);
        let kdt = p.schaake_kdt * time_step / SECONDS_PER_DAY;
        let unfrozen = (1.0 - ice_content / p.max_storage).clamp(0.0, 1.0);
        let capacity = deficit * (1.0 - (-kdt).exp()) * unfrozen;

        let infiltration = precipitation * capacity / (precipitation + capacity);
        precipitation - infiltration
    }

    /// Surface runoff under the Xinanjiang scheme
    ///
    /// The frozen fraction of the surface acts as impervious area. The remainder
    /// follows the parabolic storage capacity curve.
    pub fn xinanjiang_runoff(
        &self,
        precipitation: FloatValue,
        storage: FloatValue,
        ice_fraction: FloatValue,
    ) -> FloatValue {
        if precipitation <= 0.0 {
            return 0.0;
        }
        let p = &self.parameters;
        let ice_fraction = ice_fraction.clamp(0.0, 1.0);
        let impervious = ice_fraction * precipitation;
        let pervious_input = precipitation - impervious;

        let b = p.xinanjiang_shape;
        let wm = p.max_storage;
        let w = storage.clamp(0.0, wm);
        let wmm = wm * (1.0 + b);
        let a = wmm * (1.0 - (1.0 - w / wm).powf(1.0 / (1.0 + b)));

        let pervious = if pervious_input + a >= wmm {
            pervious_input - (wm - w)
        } else {
            pervious_input - (wm - w) + wm * (1.0 - (pervious_input + a) / wmm).powf(1.0 + b)
        };
        impervious + pervious.clamp(0.0, pervious_input)
    }

    /// Advance the reservoir by one time step
    fn step(&mut self) {
        let p = &self.parameters;
        let dt = self.clock.time_step;
        let previous = self.storage;

        // mm s-1 to m over the step
        let precipitation = (self.precipitation_rate * dt / 1000.0).max(0.0);
        let potential_evapotranspiration = (self.potential_evapotranspiration * dt).max(0.0);

        let mut surface_runoff = match p.scheme {
            RunoffScheme::Schaake => {
                self.schaake_runoff(precipitation, previous, self.ice_fraction_schaake, dt)
            }
            RunoffScheme::Xinanjiang => {
                self.xinanjiang_runoff(precipitation, previous, self.ice_fraction_xinanjiang)
            }
        };

        let mut storage = previous + precipitation - surface_runoff;
        if storage > p.max_storage {
            surface_runoff += storage - p.max_storage;
            storage = p.max_storage;
        }

        let evapotranspiration =
            (potential_evapotranspiration * storage / p.max_storage).min(storage);
        storage -= evapotranspiration;

        let percolation = storage * (1.0 - (-p.percolation_rate * dt).exp());
        storage -= percolation;

        debug!(
            precipitation,
            surface_runoff, evapotranspiration, percolation, storage, "Runoff step"
        );

        self.totals.precipitation += precipitation;
        self.totals.surface_runoff += surface_runoff;
        self.totals.evapotranspiration += evapotranspiration;
        self.totals.percolation += percolation;

        self.surface_runoff = surface_runoff;
        self.storage_change = storage - previous;
        self.storage = storage;
    }
}

impl ModelHandle for BucketRunoff {
    fn component_name(&self) -> &str {
        NAME
    }

    fn initialize(&mut self, config_file: &Path) -> CouplingResult<()> {
        self.lifecycle.initialize(NAME)?;
        let config = KeyValueConfig::from_path(config_file)?;
        let parameters = BucketRunoffParameters::from_config(&config)?;
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
        self.step();
        self.clock.advance();
        Ok(())
    }

    fn get_value(&self, key: &str) -> CouplingResult<VariableValue> {
        let value = match key {
            k if k == VAR_SURFACE_RUNOFF_SCHEME.name => {
                return Ok(VariableValue::Integer(self.parameters.scheme.code()))
            }
            k if k == VAR_SOIL_STORAGE.name => self.storage,
            k if k == VAR_SOIL_STORAGE_CHANGE.name => self.storage_change,
            k if k == VAR_SURFACE_RUNOFF.name => self.surface_runoff,
            k if k == VAR_PRECIPITATION_RATE.name => self.precipitation_rate,
            k if k == VAR_POTENTIAL_ET.name => self.potential_evapotranspiration,
            k if k == VAR_ICE_FRACTION_SCHAAKE.name => self.ice_fraction_schaake,
            k if k == VAR_ICE_FRACTION_XINANJIANG.name => self.ice_fraction_xinanjiang,
            _ => return Err(unknown_variable(NAME, key)),
        };
        Ok(VariableValue::Scalar(value))
    }

    fn set_value(&mut self, key: &str, value: VariableValue) -> CouplingResult<()> {
        let target = match key {
            k if k == VAR_PRECIPITATION_RATE.name => &mut self.precipitation_rate,
            k if k == VAR_POTENTIAL_ET.name => &mut self.potential_evapotranspiration,
            k if k == VAR_ICE_FRACTION_SCHAAKE.name => &mut self.ice_fraction_schaake,
            k if k == VAR_ICE_FRACTION_XINANJIANG.name => &mut self.ice_fraction_xinanjiang,
            _ => return Err(unknown_variable(NAME, key)),
        };
        *target = value.expect_scalar(NAME, key)?;
        Ok(())
    }

    fn input_names(&self) -> Vec<String> {
        [
            &VAR_PRECIPITATION_RATE,
            &VAR_POTENTIAL_ET,
            &VAR_ICE_FRACTION_SCHAAKE,
            &VAR_ICE_FRACTION_XINANJIANG,
        ]
        .iter()
        .map(|var| var.name.to_string())
        .collect()
    }

    fn output_names(&self) -> Vec<String> {
        [
            &VAR_SURFACE_RUNOFF_SCHEME,
            &VAR_SOIL_STORAGE,
            &VAR_SOIL_STORAGE_CHANGE,
            &VAR_SURFACE_RUNOFF,
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

impl RunoffHandle for BucketRunoff {
    fn mass_balance(&self) -> CouplingResult<MassBalanceReport> {
        Ok(MassBalanceReport {
            volume_in: self.totals.precipitation,
            volume_runoff: self.totals.surface_runoff,
            volume_evapotranspiration: self.totals.evapotranspiration,
            volume_percolation: self.totals.percolation,
            storage_initial: self.storage_initial,
            storage_final: self.storage,
            tolerance: self.parameters.mass_balance_tolerance,
        })
    }
}
