//! Recording model handles for exercising the scheduler without real models.

use crate::errors::CouplingResult;
use crate::handle::{
    unknown_variable, FreezeThawHandle, Lifecycle, ModelHandle, ModelKind, ModelSet, RunoffHandle,
};
use crate::mass_balance::MassBalanceReport;
use crate::standard_variables::*;
use crate::value::{Time, VariableValue};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// A lifecycle or exchange call made on a mock
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initialize(ModelKind),
    Update(ModelKind),
    Set(ModelKind, String, VariableValue),
    Finalize(ModelKind),
    MassBalance,
}

/// Calls shared between every mock in a set, in the order they happened
pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn new_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Mutates the mock's values during its `n`th update (counting from 0)
pub type UpdateFn = Box<dyn FnMut(usize, &mut HashMap<String, VariableValue>)>;

pub struct MockModel {
    kind: ModelKind,
    log: CallLog,
    lifecycle: Lifecycle,
    inputs: Vec<String>,
    outputs: Vec<String>,
    values: HashMap<String, VariableValue>,
    on_update: Option<UpdateFn>,
    updates: usize,
    time_step: Time,
    end_time: Time,
    fail_finalize: bool,
    /// Reject any input that is not a scalar
    scalar_inputs: bool,
}

impl MockModel {
    pub fn new(kind: ModelKind, log: &CallLog) -> Self {
        Self {
            kind,
            log: Rc::clone(log),
            lifecycle: Lifecycle::default(),
            inputs: vec![],
            outputs: vec![],
            values: HashMap::new(),
            on_update: None,
            updates: 0,
            time_step: 3600.0,
            end_time: 7200.0,
            fail_finalize: false,
            scalar_inputs: false,
        }
    }

    pub fn with_inputs(mut self, names: &[&str]) -> Self {
        for name in names {
            self.inputs.push(name.to_string());
            self.values
                .insert(name.to_string(), VariableValue::Scalar(0.0));
        }
        self
    }

    pub fn with_output(mut self, name: &str, value: VariableValue) -> Self {
        self.outputs.push(name.to_string());
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn with_clock(mut self, time_step: Time, end_time: Time) -> Self {
        self.time_step = time_step;
        self.end_time = end_time;
        self
    }

    pub fn on_update(
        mut self,
        f: impl FnMut(usize, &mut HashMap<String, VariableValue>) + 'static,
    ) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn with_scalar_inputs(mut self) -> Self {
        self.scalar_inputs = true;
        self
    }

    pub fn failing_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    fn name(&self) -> String {
        self.kind.to_string()
    }
}

impl ModelHandle for MockModel {
    fn component_name(&self) -> &str {
        match self.kind {
            ModelKind::Forcing => "Forcing",
            ModelKind::Evapotranspiration => "Evapotranspiration",
            ModelKind::Runoff => "Runoff",
            ModelKind::FreezeThaw => "FreezeThaw",
            ModelKind::SoilMoistureProfile => "SoilMoistureProfile",
        }
    }

    fn initialize(&mut self, _config_file: &Path) -> CouplingResult<()> {
        self.lifecycle.initialize(&self.name())?;
        self.log.borrow_mut().push(Call::Initialize(self.kind));
        Ok(())
    }

    fn update(&mut self) -> CouplingResult<()> {
        self.lifecycle.ensure_active(&self.name(), "update")?;
        if let Some(f) = self.on_update.as_mut() {
            f(self.updates, &mut self.values);
        }
        self.updates += 1;
        self.log.borrow_mut().push(Call::Update(self.kind));
        Ok(())
    }

    fn get_value(&self, key: &str) -> CouplingResult<VariableValue> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| unknown_variable(&self.name(), key))
    }

    fn set_value(&mut self, key: &str, value: VariableValue) -> CouplingResult<()> {
        if !self.accepts(key) {
            return Err(unknown_variable(&self.name(), key));
        }
        if self.scalar_inputs {
            value.expect_scalar(&self.name(), key)?;
        }
        self.log
            .borrow_mut()
            .push(Call::Set(self.kind, key.to_string(), value.clone()));
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn input_names(&self) -> Vec<String> {
        self.inputs.clone()
    }

    fn output_names(&self) -> Vec<String> {
        self.outputs.clone()
    }

    fn current_time(&self) -> Time {
        self.updates as Time * self.time_step
    }

    fn time_step(&self) -> Time {
        self.time_step
    }

    fn end_time(&self) -> Time {
        self.end_time
    }

    fn finalize(&mut self) -> CouplingResult<()> {
        self.lifecycle.finalize(&self.name())?;
        self.log.borrow_mut().push(Call::Finalize(self.kind));
        if self.fail_finalize {
            return Err(crate::errors::CouplingError::Error(format!(
                "{} failed to release its state",
                self.name()
            )));
        }
        Ok(())
    }
}

impl RunoffHandle for MockModel {
    fn mass_balance(&self) -> CouplingResult<MassBalanceReport> {
        self.lifecycle.ensure_active(&self.name(), "check mass balance")?;
        self.log.borrow_mut().push(Call::MassBalance);
        Ok(MassBalanceReport {
            volume_in: 0.01,
            volume_runoff: 0.002,
            volume_evapotranspiration: 0.003,
            volume_percolation: 0.001,
            storage_initial: 0.3,
            storage_final: 0.304,
            tolerance: 1e-9,
        })
    }
}

impl FreezeThawHandle for MockModel {}

pub fn mock_forcing(log: &CallLog) -> MockModel {
    let mut model = MockModel::new(ModelKind::Forcing, log);
    for var in MET_FORCING_VARIABLES {
        model = model.with_output(var.name, VariableValue::Scalar(0.0));
    }
    model.on_update(|n, values| {
        let n = n as f64;
        values.insert(VAR_AIR_TEMPERATURE.name.to_string(), (270.0 + n).into());
        values.insert(VAR_AIR_PRESSURE.name.to_string(), 101325.0.into());
        values.insert(VAR_RELATIVE_HUMIDITY.name.to_string(), 0.8.into());
        values.insert(
            VAR_PRECIPITATION_RATE.name.to_string(),
            (1e-6 * (n + 1.0)).into(),
        );
        values.insert(VAR_SHORTWAVE_RADIATION.name.to_string(), 150.0.into());
        values.insert(VAR_LONGWAVE_RADIATION.name.to_string(), 300.0.into());
        values.insert(VAR_WIND_U.name.to_string(), 1.5.into());
        values.insert(VAR_WIND_V.name.to_string(), (-0.5).into());
    })
}

pub fn mock_evapotranspiration(log: &CallLog) -> MockModel {
    let inputs: Vec<&str> = MET_FORCING_VARIABLES.iter().map(|var| var.name).collect();
    MockModel::new(ModelKind::Evapotranspiration, log)
        .with_inputs(&inputs)
        .with_output(VAR_POTENTIAL_ET.name, 0.0.into())
        .on_update(|n, values| {
            values.insert(
                VAR_POTENTIAL_ET.name.to_string(),
                (1e-8 * (n as f64 + 1.0)).into(),
            );
        })
}

/// A runoff mock reporting the given scheme code
pub fn mock_runoff(log: &CallLog, scheme_code: i64) -> MockModel {
    MockModel::new(ModelKind::Runoff, log)
        .with_inputs(&[
            VAR_PRECIPITATION_RATE.name,
            VAR_POTENTIAL_ET.name,
            VAR_ICE_FRACTION_SCHAAKE.name,
            VAR_ICE_FRACTION_XINANJIANG.name,
        ])
        .with_output(VAR_SURFACE_RUNOFF_SCHEME.name, scheme_code.into())
        .with_output(VAR_SOIL_STORAGE.name, 0.3.into())
        .with_output(VAR_SOIL_STORAGE_CHANGE.name, 0.0.into())
        .on_update(|n, values| {
            values.insert(
                VAR_SOIL_STORAGE.name.to_string(),
                (0.3 + 0.001 * (n as f64 + 1.0)).into(),
            );
            values.insert(VAR_SOIL_STORAGE_CHANGE.name.to_string(), 0.001.into());
        })
}

/// A freeze-thaw mock with the given clock and cell count
pub fn mock_freeze_thaw(log: &CallLog, time_step: Time, end_time: Time, cells: usize) -> MockModel {
    MockModel::new(ModelKind::FreezeThaw, log)
        .with_inputs(&[
            VAR_GROUND_TEMPERATURE.name,
            VAR_SOIL_MOISTURE_PROFILE.name,
            VAR_ICE_FRACTION_SCHEME.name,
        ])
        .with_output(VAR_ICE_FRACTION_SCHAAKE.name, 0.0.into())
        .with_output(VAR_ICE_FRACTION_XINANJIANG.name, 0.0.into())
        .with_output(VAR_NUM_CELLS.name, (cells as i64).into())
        .with_clock(time_step, end_time)
        .on_update(|n, values| {
            let n = n as f64 + 1.0;
            values.insert(VAR_ICE_FRACTION_SCHAAKE.name.to_string(), (0.1 * n).into());
            values.insert(VAR_ICE_FRACTION_XINANJIANG.name.to_string(), (0.2 * n).into());
        })
}

/// A profile mock reporting the given method code and producing `cells` values
pub fn mock_soil_moisture_profile(log: &CallLog, method_code: i64, cells: usize) -> MockModel {
    MockModel::new(ModelKind::SoilMoistureProfile, log)
        .with_inputs(&[
            VAR_SOIL_STORAGE_SMP.name,
            VAR_SOIL_STORAGE_CHANGE_SMP.name,
            VAR_SOIL_MOISTURE_LAYERED.name,
        ])
        .with_output(VAR_SOIL_MOISTURE_PROFILE.name, vec![0.3; cells].into())
        .with_output(VAR_SOIL_MOISTURE_METHOD.name, method_code.into())
        .on_update(move |n, values| {
            let value = 0.3 + 0.01 * (n as f64 + 1.0);
            values.insert(
                VAR_SOIL_MOISTURE_PROFILE.name.to_string(),
                vec![value; cells].into(),
            );
        })
}

/// Five mocks with matching keys: Schaake runoff, constant profile, four cells
/// and two one-hour steps
pub fn mock_models(log: &CallLog) -> ModelSet {
    ModelSet::new(
        Box::new(mock_forcing(log)),
        Box::new(mock_evapotranspiration(log)),
        Box::new(mock_runoff(log, 1)),
        Box::new(mock_freeze_thaw(log, 3600.0, 7200.0, 4)),
        Box::new(mock_soil_moisture_profile(log, 1, 4)),
    )
}
