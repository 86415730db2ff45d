//! Scheduler state and the per-step sequence.

use crate::config::CouplingConfig;
use crate::consistency::{ConsistencyChecker, ConsistencyReport};
use crate::coupling::{CouplingGraph, CouplingSelection, TransferStage};
use crate::errors::{CouplingError, CouplingResult};
use crate::forcing_series::ForcingSeries;
use crate::handle::{ModelKind, ModelSet};
use crate::mass_balance::{MassBalanceReport, MassBalanceValidator};
use crate::standard_variables::VAR_SOIL_STORAGE;
use crate::transfer::{
    couple_ice_fraction, couple_soil_moisture_profile, couple_soil_moisture_to_freeze_thaw,
    execute_stage, runoff_scheme, soil_moisture_method,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::clock::SimulationClock;

/// Configuration file for each of the coupled models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPaths {
    pub runoff: PathBuf,
    pub forcing: PathBuf,
    pub evapotranspiration: PathBuf,
    pub freeze_thaw: PathBuf,
    pub soil_moisture_profile: PathBuf,
}

impl ConfigPaths {
    pub fn get(&self, kind: ModelKind) -> &Path {
        match kind {
            ModelKind::Forcing => &self.forcing,
            ModelKind::Evapotranspiration => &self.evapotranspiration,
            ModelKind::Runoff => &self.runoff,
            ModelKind::FreezeThaw => &self.freeze_thaw,
            ModelKind::SoilMoistureProfile => &self.soil_moisture_profile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    Uninitialized,
    Running,
    Finalized,
}

impl SchedulerState {
    fn label(self) -> &'static str {
        match self {
            SchedulerState::Uninitialized => "uninitialized",
            SchedulerState::Running => "running",
            SchedulerState::Finalized => "finalized",
        }
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    /// One report per step, in step order
    pub consistency: Vec<ConsistencyReport>,
    pub mass_balance: MassBalanceReport,
}

/// Everything that is only known once the models are initialized
#[derive(Debug)]
struct ActiveRun {
    clock: SimulationClock,
    ground_temperature: ForcingSeries,
    selection: CouplingSelection,
}

/// Drives the five coupled models from initialization to finalization
pub struct Scheduler {
    models: ModelSet,
    config: CouplingConfig,
    graph: CouplingGraph,
    checker: ConsistencyChecker,
    validator: MassBalanceValidator,
    ground_temperature: Option<ForcingSeries>,
    run: Option<ActiveRun>,
    state: SchedulerState,
    reports: Vec<ConsistencyReport>,
}

impl Scheduler {
    pub fn new(models: ModelSet, config: CouplingConfig) -> Self {
        let checker =
            ConsistencyChecker::new(config.consistency.policy, config.verbosity);
        Self {
            models,
            config,
            graph: CouplingGraph::standard(),
            checker,
            validator: MassBalanceValidator,
            ground_temperature: None,
            run: None,
            state: SchedulerState::Uninitialized,
            reports: vec![],
        }
    }

    /// Use this ground temperature series instead of reading the one named by the
    /// freeze-thaw configuration file
    pub fn with_ground_temperature(mut self, series: ForcingSeries) -> Self {
        self.ground_temperature = Some(series);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    pub fn graph(&self) -> &CouplingGraph {
        &self.graph
    }

    pub fn config(&self) -> &CouplingConfig {
        &self.config
    }

    /// The clock, available once initialized
    pub fn clock(&self) -> Option<&SimulationClock> {
        self.run.as_ref().map(|run| &run.clock)
    }

    /// Consistency reports for the steps run so far
    pub fn consistency_reports(&self) -> &[ConsistencyReport] {
        &self.reports
    }

    /// Test if every step has been run
    pub fn finished(&self) -> bool {
        self.run.as_ref().map_or(true, |run| run.clock.is_finished())
    }

    fn require_state(&self, state: SchedulerState, operation: &'static str) -> CouplingResult<()> {
        if self.state != state {
            return Err(CouplingError::InvalidSchedulerState {
                operation,
                state: self.state.label(),
            });
        }
        Ok(())
    }

    /// Initialize the models and prepare the run
    ///
    /// Fails before any model is updated if the ground temperature series is too
    /// short, an option code is unknown or a coupling edge names a key one of its
    /// models doesn't recognise.
    pub fn initialize(&mut self, paths: &ConfigPaths) -> CouplingResult<()> {
        self.require_state(SchedulerState::Uninitialized, "initialize")?;

        for kind in ModelKind::INITIALIZATION_ORDER {
            let path = paths.get(kind);
            info!(model = %kind, config = %path.display(), "Initializing model");
            self.models.get_mut(kind).initialize(path)?;
        }

        let ground_temperature = match self.ground_temperature.take() {
            Some(series) => series,
            None => {
                info!("Loading ground temperature series");
                ForcingSeries::from_config_file(&paths.freeze_thaw, &self.config.ground_temperature)?
            }
        };

        let freeze_thaw = self.models.get(ModelKind::FreezeThaw);
        let clock = SimulationClock::new(freeze_thaw.end_time(), freeze_thaw.time_step())?;
        ground_temperature.ensure_covers(clock.steps())?;

        let selection = CouplingSelection {
            runoff_scheme: runoff_scheme(&self.models)?,
            soil_moisture_method: soil_moisture_method(&self.models)?,
            frozen_fraction: self.config.frozen_fraction,
        };
        self.graph.validate(&self.models, &selection)?;

        info!(
            steps = clock.steps(),
            time_step = clock.time_step(),
            runoff_scheme = %selection.runoff_scheme,
            soil_moisture_method = %selection.soil_moisture_method,
            frozen_fraction = selection.frozen_fraction,
            "Starting coupled run"
        );

        self.run = Some(ActiveRun {
            clock,
            ground_temperature,
            selection,
        });
        self.state = SchedulerState::Running;
        Ok(())
    }

    /// Run a single step
    pub fn step(&mut self) -> CouplingResult<ConsistencyReport> {
        self.require_state(SchedulerState::Running, "step")?;
        let run = self.run.as_mut().ok_or(CouplingError::InvalidSchedulerState {
            operation: "step",
            state: SchedulerState::Uninitialized.label(),
        })?;
        if run.clock.is_finished() {
            return Err(CouplingError::InvalidSchedulerState {
                operation: "step",
                state: "past its final step",
            });
        }

        let step = run.clock.current_step();
        let scheme = run.selection.runoff_scheme;
        let models = &mut self.models;
        let graph = &self.graph;
        debug!(step, time = run.clock.current_time(), "Step");

        models.forcing.update()?;
        execute_stage(models, graph, TransferStage::ForcingToEvapotranspiration, scheme)?;
        models.evapotranspiration.update()?;
        execute_stage(models, graph, TransferStage::ForcingToRunoff, scheme)?;
        execute_stage(models, graph, TransferStage::EvapotranspirationToRunoff, scheme)?;

        if self.config.frozen_fraction {
            couple_ice_fraction(models, graph)?;
        }

        let ground_temperature =
            run.ground_temperature
                .at(step)
                .ok_or(CouplingError::InsufficientForcing {
                    available: run.ground_temperature.len(),
                    required: step + 1,
                })?;
        models.freeze_thaw.set_ground_temperature(ground_temperature)?;

        let report = self.checker.check(models, step)?;

        models.runoff.update()?;
        if self.config.verbosity > 0 {
            let storage = models.get_value(ModelKind::Runoff, VAR_SOIL_STORAGE.name)?;
            info!(step, soil_storage = ?storage, "Runoff storage");
        }

        couple_soil_moisture_profile(models, graph, &self.config.soil_moisture)?;
        couple_soil_moisture_to_freeze_thaw(models, graph)?;
        models.freeze_thaw.update()?;

        run.clock.advance();
        self.reports.push(report.clone());
        Ok(report)
    }

    /// Check the water balance and release every model
    ///
    /// Only allowed once the final step has run. Every model is finalized even if
    /// an earlier one fails. The first failure is returned.
    pub fn finalize(&mut self) -> CouplingResult<MassBalanceReport> {
        self.require_state(SchedulerState::Running, "finalize")?;
        if !self.finished() {
            return Err(CouplingError::InvalidSchedulerState {
                operation: "finalize",
                state: "short of its final step",
            });
        }
        self.state = SchedulerState::Finalized;

        let mass_balance = self.validator.validate(self.models.runoff.as_ref());

        let mut first_error = None;
        for kind in ModelKind::INITIALIZATION_ORDER {
            info!(model = %kind, "Finalizing model");
            if let Err(err) = self.models.get_mut(kind).finalize() {
                first_error.get_or_insert(err);
            }
        }

        let mass_balance = mass_balance?;
        match first_error {
            Some(err) => Err(err),
            None => Ok(mass_balance),
        }
    }

    /// Run every remaining step and finalize
    pub fn run(&mut self) -> CouplingResult<RunSummary> {
        self.require_state(SchedulerState::Running, "run")?;
        while !self.finished() {
            self.step()?;
        }
        let mass_balance = self.finalize()?;

        Ok(RunSummary {
            steps: self.reports.len(),
            consistency: self.reports.clone(),
            mass_balance,
        })
    }
}
