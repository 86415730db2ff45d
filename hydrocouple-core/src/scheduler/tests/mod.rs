//! Scheduler scenarios run against recording mock models.


use crate::config::CouplingConfig;
use crate::forcing_series::ForcingSeries;
use crate::handle::{ModelKind, ModelSet};
use crate::scheduler::{ConfigPaths, Scheduler};
use crate::test_support::{Call, CallLog};
use std::path::PathBuf;

fn mock_paths() -> ConfigPaths {
    ConfigPaths {
        runoff: PathBuf::from("runoff.config"),
        forcing: PathBuf::from("forcing.config"),
        evapotranspiration: PathBuf::from("pet.config"),
        freeze_thaw: PathBuf::from("sft.config"),
        soil_moisture_profile: PathBuf::from("smp.config"),
    }
}

/// A scheduler driven by the two value ground temperature series
fn scheduler(models: ModelSet, config: CouplingConfig) -> Scheduler {
    Scheduler::new(models, config).with_ground_temperature(ForcingSeries::new(vec![-5.0, -3.2]))
}

fn count(log: &CallLog, call: &Call) -> usize {
    log.borrow().iter().filter(|c| *c == call).count()
}

fn updates(log: &CallLog) -> usize {
    log.borrow()
        .iter()
        .filter(|c| matches!(c, Call::Update(_)))
        .count()
}

/// Keys set on a model, in order
fn keys_set(log: &CallLog, kind: ModelKind) -> Vec<String> {
    log.borrow()
        .iter()
        .filter_map(|c| match c {
            Call::Set(k, key, _) if *k == kind => Some(key.clone()),
            _ => None,
        })
        .collect()
}
