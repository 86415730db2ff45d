//! The capability contract every coupled model satisfies.
//!
//! The orchestrator never inspects a model's internals. Everything it needs is
//! read and written through string-keyed variables, plus the lifecycle calls
//! `initialize`, `update` and `finalize`.

use crate::errors::{CouplingError, CouplingResult};
use crate::mass_balance::MassBalanceReport;
use crate::standard_variables::VAR_GROUND_TEMPERATURE;
use crate::value::{FloatValue, Time, VariableValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identity of each of the five coupled models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    Forcing,
    Evapotranspiration,
    Runoff,
    FreezeThaw,
    SoilMoistureProfile,
}

impl ModelKind {
    /// The order in which models are initialized
    pub const INITIALIZATION_ORDER: [ModelKind; 5] = [
        ModelKind::Runoff,
        ModelKind::Forcing,
        ModelKind::Evapotranspiration,
        ModelKind::FreezeThaw,
        ModelKind::SoilMoistureProfile,
    ];
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Forcing => "Forcing",
            ModelKind::Evapotranspiration => "Evapotranspiration",
            ModelKind::Runoff => "Runoff",
            ModelKind::FreezeThaw => "FreezeThaw",
            ModelKind::SoilMoistureProfile => "SoilMoistureProfile",
        };
        write!(f, "{}", name)
    }
}

/// Uniform interface to one coupled simulation model
pub trait ModelHandle {
    /// Name used in diagnostics
    fn component_name(&self) -> &str;

    /// Parse the model configuration. Called exactly once, before any other operation.
    fn initialize(&mut self, config_file: &Path) -> CouplingResult<()>;

    /// Advance the model by exactly one of its own time steps
    fn update(&mut self) -> CouplingResult<()>;

    /// Current value of a named quantity
    ///
    /// Returns [`CouplingError::UnknownVariable`] if the key is not recognised.
    fn get_value(&self, key: &str) -> CouplingResult<VariableValue>;

    /// Assign a named quantity
    ///
    /// A value that was set must be returned unchanged by [`ModelHandle::get_value`]
    /// until the next [`ModelHandle::update`].
    fn set_value(&mut self, key: &str, value: VariableValue) -> CouplingResult<()>;

    /// Keys the model accepts through `set_value`
    fn input_names(&self) -> Vec<String>;

    /// Keys the model provides through `get_value`
    fn output_names(&self) -> Vec<String>;

    fn current_time(&self) -> Time;

    fn time_step(&self) -> Time;

    fn end_time(&self) -> Time;

    /// Release the model state. Called exactly once, after the final update.
    fn finalize(&mut self) -> CouplingResult<()>;

    /// Test if the model accepts the key as an input
    fn accepts(&self, key: &str) -> bool {
        self.input_names().iter().any(|name| name == key)
    }

    /// Test if the model provides the key as an output
    ///
    /// Inputs can always be read back, so they count as provided.
    fn provides(&self, key: &str) -> bool {
        self.output_names().iter().any(|name| name == key) || self.accepts(key)
    }
}

/// Access a model as a plain [`ModelHandle`]
///
/// Implemented for every sized handle so that the capability traits below can be
/// used as `dyn` objects and still be passed wherever a plain handle is expected.
pub trait AsModelHandle {
    fn as_handle(&self) -> &dyn ModelHandle;
    fn as_handle_mut(&mut self) -> &mut dyn ModelHandle;
}

impl<T: ModelHandle> AsModelHandle for T {
    fn as_handle(&self) -> &dyn ModelHandle {
        self
    }

    fn as_handle_mut(&mut self) -> &mut dyn ModelHandle {
        self
    }
}

/// The rainfall-runoff model
///
/// Exposes its accumulated water-balance bookkeeping for the end-of-run check.
pub trait RunoffHandle: ModelHandle + AsModelHandle {
    fn mass_balance(&self) -> CouplingResult<MassBalanceReport>;
}

/// The frozen-soil model
///
/// Ground temperature comes from an external series rather than the forcing model,
/// so it has its own input channel that sits outside the coupling graph.
pub trait FreezeThawHandle: ModelHandle + AsModelHandle {
    fn set_ground_temperature(&mut self, temperature: FloatValue) -> CouplingResult<()> {
        self.set_value(VAR_GROUND_TEMPERATURE.name, VariableValue::Scalar(temperature))
    }
}

/// Lifecycle of a model implementation
///
/// Helper for model implementations to enforce the initialize/update/finalize ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    #[default]
    Created,
    Initialized,
    Finalized,
}

impl Lifecycle {
    fn label(self) -> &'static str {
        match self {
            Lifecycle::Created => "uninitialized",
            Lifecycle::Initialized => "initialized",
            Lifecycle::Finalized => "finalized",
        }
    }

    /// Move from `Created` to `Initialized`
    pub fn initialize(&mut self, component: &str) -> CouplingResult<()> {
        match self {
            Lifecycle::Created => {
                *self = Lifecycle::Initialized;
                Ok(())
            }
            _ => Err(self.error(component, "initialize")),
        }
    }

    /// Require the model to be initialized and not yet finalized
    pub fn ensure_active(&self, component: &str, operation: &'static str) -> CouplingResult<()> {
        match self {
            Lifecycle::Initialized => Ok(()),
            _ => Err(self.error(component, operation)),
        }
    }

    /// Move from `Initialized` to `Finalized`
    pub fn finalize(&mut self, component: &str) -> CouplingResult<()> {
        self.ensure_active(component, "finalize")?;
        *self = Lifecycle::Finalized;
        Ok(())
    }

    fn error(&self, component: &str, operation: &'static str) -> CouplingError {
        CouplingError::Lifecycle {
            component: component.to_string(),
            operation,
            state: self.label(),
        }
    }
}

/// Build the error returned for an unrecognised key
pub fn unknown_variable(component: &str, key: &str) -> CouplingError {
    CouplingError::UnknownVariable {
        component: component.to_string(),
        key: key.to_string(),
    }
}

/// The five coupled models
///
/// The set owns one handle per model for the whole run.
pub struct ModelSet {
    pub forcing: Box<dyn ModelHandle>,
    pub evapotranspiration: Box<dyn ModelHandle>,
    pub runoff: Box<dyn RunoffHandle>,
    pub freeze_thaw: Box<dyn FreezeThawHandle>,
    pub soil_moisture_profile: Box<dyn ModelHandle>,
}

impl ModelSet {
    pub fn new(
        forcing: Box<dyn ModelHandle>,
        evapotranspiration: Box<dyn ModelHandle>,
        runoff: Box<dyn RunoffHandle>,
        freeze_thaw: Box<dyn FreezeThawHandle>,
        soil_moisture_profile: Box<dyn ModelHandle>,
    ) -> Self {
        Self {
            forcing,
            evapotranspiration,
            runoff,
            freeze_thaw,
            soil_moisture_profile,
        }
    }

    pub fn get(&self, kind: ModelKind) -> &dyn ModelHandle {
        match kind {
            ModelKind::Forcing => self.forcing.as_ref(),
            ModelKind::Evapotranspiration => self.evapotranspiration.as_ref(),
            ModelKind::Runoff => self.runoff.as_handle(),
            ModelKind::FreezeThaw => self.freeze_thaw.as_handle(),
            ModelKind::SoilMoistureProfile => self.soil_moisture_profile.as_ref(),
        }
    }

    pub fn get_mut(&mut self, kind: ModelKind) -> &mut dyn ModelHandle {
        match kind {
            ModelKind::Forcing => self.forcing.as_mut(),
            ModelKind::Evapotranspiration => self.evapotranspiration.as_mut(),
            ModelKind::Runoff => self.runoff.as_handle_mut(),
            ModelKind::FreezeThaw => self.freeze_thaw.as_handle_mut(),
            ModelKind::SoilMoistureProfile => self.soil_moisture_profile.as_mut(),
        }
    }

    /// Read a value, attributing a failure to the owning model
    pub fn get_value(&self, kind: ModelKind, key: &str) -> CouplingResult<VariableValue> {
        self.get(kind).get_value(key)
    }

    pub fn set_value(
        &mut self,
        kind: ModelKind,
        key: &str,
        value: VariableValue,
    ) -> CouplingResult<()> {
        self.get_mut(kind).set_value(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialization_order() {
        assert_eq!(
            ModelKind::INITIALIZATION_ORDER,
            [
                ModelKind::Runoff,
                ModelKind::Forcing,
                ModelKind::Evapotranspiration,
                ModelKind::FreezeThaw,
                ModelKind::SoilMoistureProfile,
            ]
        );
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut lifecycle = Lifecycle::default();
        assert!(lifecycle.ensure_active("Runoff", "update").is_err());

        lifecycle.initialize("Runoff").unwrap();
        lifecycle.ensure_active("Runoff", "update").unwrap();

        // Initialize is only valid once
        let err = lifecycle.initialize("Runoff").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot initialize component 'Runoff' while it is initialized"
        );

        lifecycle.finalize("Runoff").unwrap();
        assert!(lifecycle.finalize("Runoff").is_err());
        assert!(lifecycle.ensure_active("Runoff", "update").is_err());
    }
}
