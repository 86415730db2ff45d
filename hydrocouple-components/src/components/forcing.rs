//! Meteorological forcing read from an AORC style CSV file
//!
//! Each row of the file holds one time step of hourly forcing. The time column is
//! ignored; rows are consumed in order, one per update.

use crate::clock::ModelClock;
use hydrocouple_core::config_file::KeyValueConfig;
use hydrocouple_core::errors::{CouplingError, CouplingResult};
use hydrocouple_core::forcing_series::CsvTable;
use hydrocouple_core::handle::{unknown_variable, Lifecycle, ModelHandle};
use hydrocouple_core::standard_variables::*;
use hydrocouple_core::value::{FloatValue, Time, VariableValue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const NAME: &str = "CsvForcing";

const COLUMN_LONGWAVE: &str = "DLWRF_surface";
const COLUMN_SHORTWAVE: &str = "DSWRF_surface";
const COLUMN_PRESSURE: &str = "PRES_surface";
const COLUMN_SPECIFIC_HUMIDITY: &str = "SPFH_2maboveground";
const COLUMN_AIR_TEMPERATURE: &str = "TMP_2maboveground";
const COLUMN_WIND_U: &str = "UGRD_10maboveground";
const COLUMN_WIND_V: &str = "VGRD_10maboveground";
/// Precipitation rate in mm s-1, preferred when present
const COLUMN_PRECIPITATION_RATE: &str = "precip_rate";
/// Accumulated precipitation over the step in kg m-2
const COLUMN_PRECIPITATION: &str = "APCP_surface";

/// Forcing values for one time step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForcingRecord {
    /// unit: K
    pub air_temperature: FloatValue,
    /// unit: Pa
    pub air_pressure: FloatValue,
    /// unit: kg kg-1
    pub specific_humidity: FloatValue,
    /// unit: mm s-1
    pub precipitation_rate: FloatValue,
    /// unit: W m-2
    pub shortwave_radiation: FloatValue,
    /// unit: W m-2
    pub longwave_radiation: FloatValue,
    /// unit: m s-1
    pub wind_u: FloatValue,
    /// unit: m s-1
    pub wind_v: FloatValue,
}

/// Relative humidity (0-1) from specific humidity, pressure (Pa) and temperature (K)
///
/// Saturation vapour pressure follows the Bolton (1980) fit.
pub fn relative_humidity(
    specific_humidity: FloatValue,
    pressure: FloatValue,
    temperature: FloatValue,
) -> FloatValue {
    let vapour_pressure = specific_humidity * pressure / (0.622 + 0.378 * specific_humidity);
    let celsius = temperature - 273.15;
    let saturation = 611.2 * (17.67 * celsius / (celsius + 243.5)).exp();
    (vapour_pressure / saturation).clamp(0.0, 1.0)
}

/// Forcing model backed by a CSV file
///
/// Configuration keys:
/// - `forcing_file`: path to the CSV file (required)
/// - `time_step`: length of each row, default 3600 s
#[derive(Debug, Default)]
pub struct CsvForcing {
    lifecycle: Lifecycle,
    clock: ModelClock,
    records: Vec<ForcingRecord>,
    current: ForcingRecord,
    next_row: usize,
}

impl CsvForcing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a forcing model from records already in memory
    pub fn from_records(records: Vec<ForcingRecord>, time_step: Time) -> Self {
        let end_time = records.len() as Time * time_step;
        Self {
            clock: ModelClock::new(time_step, end_time),
            current: records.first().cloned().unwrap_or_default(),
            records,
            ..Self::default()
        }
    }

    /// Read every row of a forcing table
    pub fn read_records(table: &CsvTable, time_step: Time) -> CouplingResult<Vec<ForcingRecord>> {
        let precipitation_rate = match table.column_index(COLUMN_PRECIPITATION_RATE) {
            Some(index) => table.column_values(index)?,
            None => table
                .named_column(COLUMN_PRECIPITATION)?
                .into_iter()
                .map(|depth| depth / time_step)
                .collect(),
        };
        let air_temperature = table.named_column(COLUMN_AIR_TEMPERATURE)?;
        let air_pressure = table.named_column(COLUMN_PRESSURE)?;
        let specific_humidity = table.named_column(COLUMN_SPECIFIC_HUMIDITY)?;
        let shortwave = table.named_column(COLUMN_SHORTWAVE)?;
        let longwave = table.named_column(COLUMN_LONGWAVE)?;
        let wind_u = table.named_column(COLUMN_WIND_U)?;
        let wind_v = table.named_column(COLUMN_WIND_V)?;

        Ok((0..table.len())
            .map(|i| ForcingRecord {
                air_temperature: air_temperature[i],
                air_pressure: air_pressure[i],
                specific_humidity: specific_humidity[i],
                precipitation_rate: precipitation_rate[i],
                shortwave_radiation: shortwave[i],
                longwave_radiation: longwave[i],
                wind_u: wind_u[i],
                wind_v: wind_v[i],
            })
            .collect())
    }
}

impl ModelHandle for CsvForcing {
    fn component_name(&self) -> &str {
        NAME
    }

    fn initialize(&mut self, config_file: &Path) -> CouplingResult<()> {
        self.lifecycle.initialize(NAME)?;

        let config = KeyValueConfig::from_path(config_file)?;
        let clock = ModelClock::from_config(&config, "time_step", "end_time", 3600.0)?;
        let forcing_file = Path::new(config.require("forcing_file")?);
        let table = CsvTable::from_path(forcing_file)?;
        let records = Self::read_records(&table, clock.time_step)?;
        if records.is_empty() {
            return Err(CouplingError::Initialization {
                component: NAME.to_string(),
                path: config_file.to_path_buf(),
                reason: format!("{} has no forcing rows", forcing_file.display()),
            });
        }

        info!(
            path = %forcing_file.display(),
            rows = records.len(),
            "Loaded meteorological forcing"
        );
        self.clock = ModelClock::new(clock.time_step, records.len() as Time * clock.time_step);
        self.current = records[0].clone();
        self.records = records;
        Ok(())
    }

    fn update(&mut self) -> CouplingResult<()> {
        self.lifecycle.ensure_active(NAME, "update")?;
        let record = self.records.get(self.next_row).ok_or_else(|| {
            CouplingError::InsufficientForcing {
                available: self.records.len(),
                required: self.next_row + 1,
            }
        })?;
        self.current = record.clone();
        self.next_row += 1;
        self.clock.advance();
        Ok(())
    }

    fn get_value(&self, key: &str) -> CouplingResult<VariableValue> {
        let record = &self.current;
        let value = match key {
            k if k == VAR_AIR_TEMPERATURE.name => record.air_temperature,
            k if k == VAR_AIR_PRESSURE.name => record.air_pressure,
            k if k == VAR_RELATIVE_HUMIDITY.name => relative_humidity(
                record.specific_humidity,
                record.air_pressure,
                record.air_temperature,
            ),
            k if k == VAR_PRECIPITATION_RATE.name => record.precipitation_rate,
            k if k == VAR_SHORTWAVE_RADIATION.name => record.shortwave_radiation,
            k if k == VAR_LONGWAVE_RADIATION.name => record.longwave_radiation,
            k if k == VAR_WIND_U.name => record.wind_u,
            k if k == VAR_WIND_V.name => record.wind_v,
            _ => return Err(unknown_variable(NAME, key)),
        };
        Ok(VariableValue::Scalar(value))
    }

    fn set_value(&mut self, key: &str, _value: VariableValue) -> CouplingResult<()> {
        Err(unknown_variable(NAME, key))
    }

    fn input_names(&self) -> Vec<String> {
        vec![]
    }

    fn output_names(&self) -> Vec<String> {
        MET_FORCING_VARIABLES
            .iter()
            .map(|var| var.name.to_string())
            .collect()
    }

    fn current_time(&self) -> Time {
        self.clock.current_time
    }

    fn time_step(&self) -> Time {
        self.clock.time_step
    }

    fn end_time(&self) -> Time {
        self.clock.end_time
    }

    fn finalize(&mut self) -> CouplingResult<()> {
        self.lifecycle.finalize(NAME)?;
        self.records.clear();
        Ok(())
    }
}
