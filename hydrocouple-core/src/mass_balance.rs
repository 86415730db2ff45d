//! End-of-run water balance check against the runoff model's bookkeeping.

use crate::errors::CouplingResult;
use crate::handle::RunoffHandle;
use crate::value::FloatValue;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Cumulative water balance of the runoff model
///
/// All volumes are depths over the catchment in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassBalanceReport {
    /// Total precipitation received
    pub volume_in: FloatValue,
    /// Surface runoff leaving the soil reservoir
    pub volume_runoff: FloatValue,
    /// Actual evapotranspiration removed from the soil reservoir
    pub volume_evapotranspiration: FloatValue,
    /// Water percolated out of the bottom of the soil reservoir
    pub volume_percolation: FloatValue,
    pub storage_initial: FloatValue,
    pub storage_final: FloatValue,
    /// Largest residual that still counts as balanced
    pub tolerance: FloatValue,
}

impl MassBalanceReport {
    pub fn volume_out(&self) -> FloatValue {
        self.volume_runoff + self.volume_evapotranspiration + self.volume_percolation
    }

    pub fn storage_change(&self) -> FloatValue {
        self.storage_final - self.storage_initial
    }

    /// Input minus outputs minus the change in storage
    pub fn residual(&self) -> FloatValue {
        self.volume_in - self.volume_out() - self.storage_change()
    }

    pub fn is_balanced(&self) -> bool {
        self.residual().abs() <= self.tolerance
    }
}

/// Runs the water balance check once the time loop has finished
#[derive(Debug, Default)]
pub struct MassBalanceValidator;

impl MassBalanceValidator {
    /// Query the runoff model's bookkeeping and report the result
    ///
    /// An imbalance is reported but never halts the run.
    pub fn validate(&self, runoff: &dyn RunoffHandle) -> CouplingResult<MassBalanceReport> {
        let report = runoff.mass_balance()?;

        info!(
            volume_in = report.volume_in,
            volume_runoff = report.volume_runoff,
            volume_evapotranspiration = report.volume_evapotranspiration,
            volume_percolation = report.volume_percolation,
            storage_change = report.storage_change(),
            "Mass balance for {}",
            runoff.component_name()
        );

        if report.is_balanced() {
            info!(residual = report.residual(), "Mass balance closed");
        } else {
            warn!(
                residual = report.residual(),
                tolerance = report.tolerance,
                "Mass balance error exceeds tolerance"
            );
        }

        Ok(report)
    }
}
