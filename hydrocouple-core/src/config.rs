//! Orchestrator configuration.
//!
//! Every option has a default, so an empty document (or no file at all) gives the
//! standard coupling behaviour.
//!
//! ```toml
//! frozen_fraction = true
//! verbosity = 0
//!
//! [consistency]
//! policy = "continue"
//!
//! [soil_moisture]
//! layered_fractions = [0.25, 0.15, 0.1, 0.12]
//!
//! [ground_temperature]
//! column = "TMP_ground_surface"
//! fallback_column_index = 6
//! ```

use crate::consistency::MismatchPolicy;
use crate::errors::{CouplingError, CouplingResult};
use crate::forcing_series::GroundTemperatureColumn;
use crate::value::FloatValue;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of conceptual layers in the layered soil moisture vector
pub const SOIL_MOISTURE_LAYERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CouplingConfig {
    /// Pass ice fraction from the freeze-thaw model to the runoff model every step
    pub frozen_fraction: bool,
    /// Diagnostic verbosity
    ///
    /// Above 0 the runoff storage is reported every step. Above 2 the potential
    /// evapotranspiration pair is reported every step whether or not it matches.
    pub verbosity: u8,
    pub consistency: ConsistencyConfig,
    pub soil_moisture: SoilMoistureConfig,
    pub ground_temperature: GroundTemperatureColumn,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            frozen_fraction: true,
            verbosity: 0,
            consistency: ConsistencyConfig::default(),
            soil_moisture: SoilMoistureConfig::default(),
            ground_temperature: GroundTemperatureColumn::default(),
        }
    }
}

impl CouplingConfig {
    /// Read a TOML configuration file
    pub fn from_path(path: &Path) -> CouplingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CouplingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> CouplingResult<Self> {
        let config: CouplingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that the type system can't
    pub fn validate(&self) -> CouplingResult<()> {
        if let Some(fraction) = self
            .soil_moisture
            .layered_fractions
            .iter()
            .find(|f| !(0.0..=1.0).contains(*f))
        {
            return Err(CouplingError::Config(format!(
                "soil_moisture.layered_fractions must lie in [0, 1], got {}",
                fraction
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsistencyConfig {
    pub policy: MismatchPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoilMoistureConfig {
    /// Moisture fraction of each conceptual layer, set into the profile model
    /// when it runs the layered method
    pub layered_fractions: [FloatValue; SOIL_MOISTURE_LAYERS],
}

impl Default for SoilMoistureConfig {
    fn default() -> Self {
        Self {
            layered_fractions: [0.25, 0.15, 0.1, 0.12],
        }
    }
}
