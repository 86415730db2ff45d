//! Execution of coupling edges against a set of models.
//!
//! A stage is committed as a unit. Every source value is read and every
//! destination key is checked before the first value is written. If a
//! destination then rejects a value, the edges already written are restored to
//! the values they held before the stage, so a failure leaves the destination
//! models untouched.

use crate::config::SoilMoistureConfig;
use crate::coupling::{CouplingEdge, CouplingGraph, TransferStage};
use crate::errors::{CouplingError, CouplingResult};
use crate::handle::{ModelKind, ModelSet};
use crate::scheme::{RunoffScheme, SoilMoistureMethod};
use crate::standard_variables::{
    VAR_NUM_CELLS, VAR_SOIL_MOISTURE_LAYERED, VAR_SOIL_MOISTURE_METHOD, VAR_SOIL_MOISTURE_PROFILE,
    VAR_SURFACE_RUNOFF_SCHEME,
};
use crate::value::VariableValue;
use tracing::{debug, warn};

/// Copy a set of edges as one all-or-nothing transfer
pub fn transfer(models: &mut ModelSet, edges: &[&CouplingEdge]) -> CouplingResult<()> {
    let mut staged = Vec::with_capacity(edges.len());
    for edge in edges {
        let value = models.get_value(edge.source, edge.source_key)?;
        staged.push((*edge, value));
    }

    let mut previous = Vec::with_capacity(staged.len());
    for (edge, _) in &staged {
        let destination = models.get(edge.destination);
        if !destination.accepts(edge.destination_key) {
            return Err(CouplingError::UnknownVariable {
                component: destination.component_name().to_string(),
                key: edge.destination_key.to_string(),
            });
        }
        previous.push(models.get_value(edge.destination, edge.destination_key)?);
    }

    for (written, (edge, value)) in staged.into_iter().enumerate() {
        debug!(edge = %edge, value = ?value, "Transfer");
        if let Err(err) = models.set_value(edge.destination, edge.destination_key, value) {
            let written: Vec<_> = edges[..written].iter().copied().zip(previous).collect();
            restore(models, written);
            return Err(err);
        }
    }
    Ok(())
}

/// Write back the values destinations held before a failed transfer
fn restore(models: &mut ModelSet, written: Vec<(&CouplingEdge, VariableValue)>) {
    for (edge, value) in written.into_iter().rev() {
        if let Err(err) = models.set_value(edge.destination, edge.destination_key, value) {
            warn!(edge = %edge, error = %err, "Could not restore value after a failed transfer");
        }
    }
}

/// Execute every edge of a stage that is active under the runoff scheme
pub fn execute_stage(
    models: &mut ModelSet,
    graph: &CouplingGraph,
    stage: TransferStage,
    runoff_scheme: RunoffScheme,
) -> CouplingResult<()> {
    let edges = graph.active_edges(stage, runoff_scheme);
    transfer(models, &edges)
}

/// Read an integer option code
///
/// Codes published as floating point values are accepted when they are whole numbers.
pub fn read_code(models: &ModelSet, kind: ModelKind, key: &str) -> CouplingResult<i64> {
    let value = models.get_value(kind, key)?;
    match value {
        VariableValue::Integer(code) => Ok(code),
        VariableValue::Scalar(code) if code.fract() == 0.0 && code.is_finite() => Ok(code as i64),
        other => other.expect_integer(models.get(kind).component_name(), key),
    }
}

/// The surface runoff scheme the runoff model currently uses
pub fn runoff_scheme(models: &ModelSet) -> CouplingResult<RunoffScheme> {
    RunoffScheme::try_from(read_code(
        models,
        ModelKind::Runoff,
        VAR_SURFACE_RUNOFF_SCHEME.name,
    )?)
}

/// The method the soil moisture profile model currently uses
pub fn soil_moisture_method(models: &ModelSet) -> CouplingResult<SoilMoistureMethod> {
    SoilMoistureMethod::try_from(read_code(
        models,
        ModelKind::SoilMoistureProfile,
        VAR_SOIL_MOISTURE_METHOD.name,
    )?)
}

/// Pass ice fraction from the freeze-thaw model to the runoff model
///
/// The runoff scheme is forwarded to the freeze-thaw model first. Only the ice
/// fraction matching that scheme is copied, the other is never set.
pub fn couple_ice_fraction(
    models: &mut ModelSet,
    graph: &CouplingGraph,
) -> CouplingResult<RunoffScheme> {
    let scheme = runoff_scheme(models)?;
    execute_stage(models, graph, TransferStage::RunoffSchemeToFreezeThaw, scheme)?;
    execute_stage(models, graph, TransferStage::FreezeThawToRunoff, scheme)?;
    Ok(scheme)
}

/// Pass soil storage to the profile model and advance it
///
/// Under the layered method the per-layer moisture fractions are set before the update.
pub fn couple_soil_moisture_profile(
    models: &mut ModelSet,
    graph: &CouplingGraph,
    config: &SoilMoistureConfig,
) -> CouplingResult<SoilMoistureMethod> {
    let edges: Vec<_> = graph
        .stage(TransferStage::RunoffToSoilMoistureProfile)
        .collect();
    transfer(models, &edges)?;

    let method = soil_moisture_method(models)?;
    match method {
        SoilMoistureMethod::Constant => {}
        SoilMoistureMethod::Layered => {
            models.set_value(
                ModelKind::SoilMoistureProfile,
                VAR_SOIL_MOISTURE_LAYERED.name,
                VariableValue::Vector(config.layered_fractions.to_vec()),
            )?;
        }
    }
    models.get_mut(ModelKind::SoilMoistureProfile).update()?;
    Ok(method)
}

/// Pass the soil moisture profile to the freeze-thaw model
///
/// The profile must have exactly one value per freeze-thaw cell.
pub fn couple_soil_moisture_to_freeze_thaw(
    models: &mut ModelSet,
    graph: &CouplingGraph,
) -> CouplingResult<()> {
    let cells = read_code(models, ModelKind::FreezeThaw, VAR_NUM_CELLS.name)?;
    let profile = models.get_value(
        ModelKind::SoilMoistureProfile,
        VAR_SOIL_MOISTURE_PROFILE.name,
    )?;
    let found = profile
        .expect_vector(
            models.get(ModelKind::SoilMoistureProfile).component_name(),
            VAR_SOIL_MOISTURE_PROFILE.name,
        )?
        .len();
    let expected = usize::try_from(cells).map_err(|_| {
        CouplingError::Error(format!(
            "{} reported an invalid cell count {}",
            models.get(ModelKind::FreezeThaw).component_name(),
            cells
        ))
    })?;
    if found != expected {
        return Err(CouplingError::LengthMismatch {
            key: VAR_SOIL_MOISTURE_PROFILE.name.to_string(),
            expected,
            found,
        });
    }

    let edges: Vec<_> = graph
        .stage(TransferStage::SoilMoistureProfileToFreezeThaw)
        .collect();
    transfer(models, &edges)
}
