//! hydrocouple couples forcing, evapotranspiration, runoff, freeze-thaw and soil
//! moisture profile models through a shared variable interface.
//!
//! The orchestration lives in [`hydrocouple_core`]. The reference models that the
//! `hydrocouple` binary runs live in [`hydrocouple_components`].

use hydrocouple_core::config::CouplingConfig;
use hydrocouple_core::errors::CouplingResult;
use hydrocouple_core::scheduler::{ConfigPaths, RunSummary, Scheduler};
use std::path::Path;

pub use hydrocouple_components::reference_models;

/// Read the coupling configuration, or use the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> CouplingResult<CouplingConfig> {
    match path {
        Some(path) => CouplingConfig::from_path(path),
        None => Ok(CouplingConfig::default()),
    }
}

/// Run the reference models from their configuration files to completion
pub fn run(paths: &ConfigPaths, config: CouplingConfig) -> CouplingResult<RunSummary> {
    let mut scheduler = Scheduler::new(reference_models(), config);
    scheduler.initialize(paths)?;
    scheduler.run()
}
