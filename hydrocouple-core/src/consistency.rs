//! Cross-model consistency checks.
//!
//! Several quantities are held by two models at once: the value a model produced
//! and the copy another model received through a transfer. The copies are verbatim,
//! so any difference means a transfer failed silently. Comparison is exact.

use crate::errors::{CouplingError, CouplingResult};
use crate::handle::{ModelKind, ModelSet};
use crate::standard_variables::{VAR_AIR_TEMPERATURE, VAR_POTENTIAL_ET, VAR_PRECIPITATION_RATE};
use crate::value::FloatValue;
use crate::variable::VariableDefinition;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What happens when a redundantly held quantity differs between two models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Report the mismatch and keep running
    #[default]
    Continue,
    /// Stop the run with an error
    Halt,
}

/// A quantity read from two models that must agree
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyPair {
    pub label: &'static str,
    pub variable: &'static VariableDefinition,
    /// The model that produced the value
    pub producer: ModelKind,
    /// The model that received a copy
    pub consumer: ModelKind,
}

/// The pairs compared after every step's transfers
pub static CONSISTENCY_PAIRS: [ConsistencyPair; 3] = [
    ConsistencyPair {
        label: "air temperature",
        variable: &VAR_AIR_TEMPERATURE,
        producer: ModelKind::Forcing,
        consumer: ModelKind::Evapotranspiration,
    },
    ConsistencyPair {
        label: "precipitation",
        variable: &VAR_PRECIPITATION_RATE,
        producer: ModelKind::Forcing,
        consumer: ModelKind::Runoff,
    },
    ConsistencyPair {
        label: "potential evapotranspiration",
        variable: &VAR_POTENTIAL_ET,
        producer: ModelKind::Evapotranspiration,
        consumer: ModelKind::Runoff,
    },
];

/// A pair of values that differed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub label: String,
    pub key: String,
    pub producer: ModelKind,
    pub producer_value: FloatValue,
    pub consumer: ModelKind,
    pub consumer_value: FloatValue,
}

/// Outcome of the checks for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub step: usize,
    pub mismatches: Vec<Mismatch>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compares redundantly held quantities between models
///
/// The checker only reads from the models.
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    policy: MismatchPolicy,
    verbosity: u8,
}

impl ConsistencyChecker {
    pub fn new(policy: MismatchPolicy, verbosity: u8) -> Self {
        Self { policy, verbosity }
    }

    pub fn policy(&self) -> MismatchPolicy {
        self.policy
    }

    /// Compare every pair for the current step
    ///
    /// Under [`MismatchPolicy::Halt`] any mismatch is returned as an error.
    pub fn check(&self, models: &ModelSet, step: usize) -> CouplingResult<ConsistencyReport> {
        let mut mismatches = Vec::new();

        for pair in CONSISTENCY_PAIRS.iter() {
            let key = pair.variable.name;
            let producer_value = models
                .get_value(pair.producer, key)?
                .expect_scalar(&pair.producer.to_string(), key)?;
            let consumer_value = models
                .get_value(pair.consumer, key)?
                .expect_scalar(&pair.consumer.to_string(), key)?;

            if self.verbosity > 2 && pair.variable.name == VAR_POTENTIAL_ET.name {
                info!(
                    step,
                    producer = %pair.producer,
                    producer_value,
                    consumer = %pair.consumer,
                    consumer_value,
                    "{} values", pair.label
                );
            }

            // Values are copied verbatim so anything but exact equality is an error
            #[allow(clippy::float_cmp)]
            let matches = producer_value == consumer_value;
            if !matches {
                warn!(
                    step,
                    producer = %pair.producer,
                    producer_value,
                    consumer = %pair.consumer,
                    consumer_value,
                    "{} values do not match", pair.label
                );
                mismatches.push(Mismatch {
                    label: pair.label.to_string(),
                    key: key.to_string(),
                    producer: pair.producer,
                    producer_value,
                    consumer: pair.consumer,
                    consumer_value,
                });
            }
        }

        let report = ConsistencyReport { step, mismatches };
        if self.policy == MismatchPolicy::Halt && !report.is_consistent() {
            let details = report
                .mismatches
                .iter()
                .map(|m| {
                    format!(
                        "{} from {} is {} but {} has {}",
                        m.label, m.producer, m.producer_value, m.consumer, m.consumer_value
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CouplingError::ConsistencyViolation { step, details });
        }

        Ok(report)
    }
}

impl Default for ConsistencyChecker {
    fn default() -> Self {
        Self::new(MismatchPolicy::default(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_models, new_log};
    use std::path::Path;

    fn running_models(precipitation: FloatValue) -> ModelSet {
        let log = new_log();
        let mut models = mock_models(&log);
        for kind in ModelKind::INITIALIZATION_ORDER {
            models
                .get_mut(kind)
                .initialize(Path::new("mock.config"))
                .unwrap();
        }
        models
            .set_value(
                ModelKind::Evapotranspiration,
                VAR_AIR_TEMPERATURE.name,
                0.0.into(),
            )
            .unwrap();
        models
            .set_value(
                ModelKind::Runoff,
                VAR_PRECIPITATION_RATE.name,
                precipitation.into(),
            )
            .unwrap();
        models
    }

    #[test]
    fn test_consistent_models() {
        let report = ConsistencyChecker::default()
            .check(&running_models(0.0), 4)
            .unwrap();
        assert_eq!(report.step, 4);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_mismatch_is_reported() {
        let checker = ConsistencyChecker::new(MismatchPolicy::Continue, 3);
        let report = checker.check(&running_models(1e-6), 0).unwrap();

        assert_eq!(
            report.mismatches,
            vec![Mismatch {
                label: "precipitation".to_string(),
                key: VAR_PRECIPITATION_RATE.name.to_string(),
                producer: ModelKind::Forcing,
                producer_value: 0.0,
                consumer: ModelKind::Runoff,
                consumer_value: 1e-6,
            }]
        );
    }

    #[test]
    fn test_halt_policy() {
        let checker = ConsistencyChecker::new(MismatchPolicy::Halt, 0);
        assert_eq!(checker.policy(), MismatchPolicy::Halt);

        let err = checker.check(&running_models(1e-6), 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Consistency check failed at step 2: precipitation from Forcing is 0 but Runoff has 0.000001"
        );
    }

    #[test]
    fn test_policy_names() {
        let policy: MismatchPolicy = serde_json::from_str("\"halt\"").unwrap();
        assert_eq!(policy, MismatchPolicy::Halt);
        assert_eq!(
            serde_json::to_string(&MismatchPolicy::default()).unwrap(),
            "\"continue\""
        );
    }
}
