use crate::errors::{CouplingError, CouplingResult};
use crate::value::Time;
use serde::{Deserialize, Serialize};

/// Step counter for the coupled run
///
/// The number of steps is `floor(end_time / time_step)`. A trailing partial step is
/// never run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    time_step: Time,
    end_time: Time,
    steps: usize,
    step_index: usize,
}

impl SimulationClock {
    pub fn new(end_time: Time, time_step: Time) -> CouplingResult<Self> {
        if !end_time.is_finite() || !time_step.is_finite() || time_step <= 0.0 || end_time < 0.0 {
            return Err(CouplingError::InvalidClock {
                end_time,
                time_step,
            });
        }

        Ok(Self {
            time_step,
            end_time,
            steps: (end_time / time_step).floor() as usize,
            step_index: 0,
        })
    }

    /// Total number of steps in the run
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Index of the next step to run
    pub fn current_step(&self) -> usize {
        self.step_index
    }

    /// Time at the start of the next step
    pub fn current_time(&self) -> Time {
        self.step_index as Time * self.time_step
    }

    pub fn time_step(&self) -> Time {
        self.time_step
    }

    pub fn end_time(&self) -> Time {
        self.end_time
    }

    pub fn is_finished(&self) -> bool {
        self.step_index >= self.steps
    }

    pub(super) fn advance(&mut self) {
        self.step_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_count() {
        assert_eq!(SimulationClock::new(7200.0, 3600.0).unwrap().steps(), 2);
        assert_eq!(SimulationClock::new(7199.0, 3600.0).unwrap().steps(), 1);
        assert_eq!(SimulationClock::new(86400.0, 3600.0).unwrap().steps(), 24);
        assert_eq!(SimulationClock::new(0.0, 3600.0).unwrap().steps(), 0);
    }

    #[test]
    fn test_advance() {
        let mut clock = SimulationClock::new(7200.0, 3600.0).unwrap();
        assert_eq!(clock.current_time(), 0.0);
        assert!(!clock.is_finished());

        clock.advance();
        assert_eq!(clock.current_step(), 1);
        assert_eq!(clock.current_time(), 3600.0);

        clock.advance();
        assert!(clock.is_finished());
    }

    #[test]
    fn test_invalid_clock() {
        for (end_time, time_step) in [(7200.0, 0.0), (7200.0, -1.0), (f64::NAN, 1.0), (-1.0, 1.0)] {
            assert!(matches!(
                SimulationClock::new(end_time, time_step),
                Err(CouplingError::InvalidClock { .. })
            ));
        }
    }
}
