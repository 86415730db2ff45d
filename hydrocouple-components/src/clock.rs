use hydrocouple_core::config_file::KeyValueConfig;
use hydrocouple_core::errors::{CouplingError, CouplingResult};
use hydrocouple_core::value::Time;
use serde::{Deserialize, Serialize};

/// Time keeping for a single model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelClock {
    pub current_time: Time,
    pub time_step: Time,
    pub end_time: Time,
}

impl ModelClock {
    pub fn new(time_step: Time, end_time: Time) -> Self {
        Self {
            current_time: 0.0,
            time_step,
            end_time,
        }
    }

    /// Read `time_step_key` and `end_time_key` from a model configuration
    ///
    /// A missing time step falls back to `default_time_step`. A missing end time
    /// leaves the model unbounded.
    pub fn from_config(
        config: &KeyValueConfig,
        time_step_key: &str,
        end_time_key: &str,
        default_time_step: Time,
    ) -> CouplingResult<Self> {
        let time_step = config
            .parse_seconds(time_step_key)?
            .unwrap_or(default_time_step);
        if time_step.is_nan() || time_step <= 0.0 {
            return Err(CouplingError::Config(format!(
                "{} must be positive in {}",
                time_step_key,
                config.path().display()
            )));
        }
        let end_time = config.parse_seconds(end_time_key)?.unwrap_or(Time::MAX);
        Ok(Self::new(time_step, end_time))
    }

    pub fn advance(&mut self) {
        self.current_time += self.time_step;
    }
}

impl Default for ModelClock {
    fn default() -> Self {
        Self::new(3600.0, Time::MAX)
    }
}
