//! Loading of the external ground temperature series.
//!
//! The live forcing model does not carry a ground surface temperature, so the
//! freeze-thaw model is driven from a column of the forcing CSV file referenced
//! by its own configuration (`forcing_file=<path>`).

use crate::config_file::KeyValueConfig;
use crate::errors::{CouplingError, CouplingResult};
use crate::value::FloatValue;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A comma separated table with a header row
///
/// Cells are kept as strings and only parsed when a column is extracted.
#[derive(Debug, Clone)]
pub struct CsvTable {
    path: PathBuf,
    header: StringRecord,
    /// (line number, cells) for each data row
    rows: Vec<(usize, StringRecord)>,
}

impl CsvTable {
    pub fn from_path(path: &Path) -> CouplingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CouplingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse CSV content. `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> CouplingResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let header = reader
            .headers()
            .map_err(|err| parse_error(path, &err))?
            .clone();
        if header.iter().all(|column| column.is_empty()) {
            return Err(CouplingError::Parse {
                path: path.to_path_buf(),
                line: 1,
                message: "missing header row".to_string(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| parse_error(path, &err))?;
            let line = record
                .position()
                .map_or(rows.len() + 2, |position| position.line() as usize);
            rows.push((line, record));
        }

        Ok(Self {
            path: path.to_path_buf(),
            header,
            rows,
        })
    }

    pub fn header(&self) -> Vec<&str> {
        self.header.iter().collect()
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }

    /// Parse every value of a column as a float
    pub fn column_values(&self, index: usize) -> CouplingResult<Vec<FloatValue>> {
        let column = self.header.get(index).ok_or_else(|| CouplingError::Parse {
            path: self.path.clone(),
            line: 1,
            message: format!(
                "column {} requested but the header only has {} columns",
                index,
                self.header.len()
            ),
        })?;

        self.rows
            .iter()
            .map(|(line, record)| {
                let cell = record.get(index).ok_or_else(|| CouplingError::Parse {
                    path: self.path.clone(),
                    line: *line,
                    message: format!(
                        "expected {} columns, got {}",
                        self.header.len(),
                        record.len()
                    ),
                })?;
                cell.parse::<FloatValue>().map_err(|_| CouplingError::Parse {
                    path: self.path.clone(),
                    line: *line,
                    message: format!("invalid number '{}' in column '{}'", cell, column),
                })
            })
            .collect()
    }

    /// Parse every value of a named column as a float
    pub fn named_column(&self, name: &str) -> CouplingResult<Vec<FloatValue>> {
        let index = self.column_index(name).ok_or_else(|| CouplingError::Parse {
            path: self.path.clone(),
            line: 1,
            message: format!("missing column '{}'", name),
        })?;
        self.column_values(index)
    }
}

fn parse_error(path: &Path, err: &csv::Error) -> CouplingError {
    CouplingError::Parse {
        path: path.to_path_buf(),
        line: err.position().map_or(1, |position| position.line() as usize),
        message: err.to_string(),
    }
}

/// Which column holds the ground temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroundTemperatureColumn {
    /// Column located by name in the header
    pub column: String,
    /// Column used when no header entry matches `column`
    pub fallback_column_index: usize,
}

impl Default for GroundTemperatureColumn {
    fn default() -> Self {
        Self {
            column: "TMP_ground_surface".to_string(),
            // The air temperature column of an AORC forcing file
            fallback_column_index: 6,
        }
    }
}

/// Ordered ground temperature values, one per simulation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingSeries {
    values: Vec<FloatValue>,
}

impl ForcingSeries {
    pub fn new(values: Vec<FloatValue>) -> Self {
        Self { values }
    }

    /// Load the series named by the `forcing_file` key of a model configuration file
    pub fn from_config_file(
        config_file: &Path,
        column: &GroundTemperatureColumn,
    ) -> CouplingResult<Self> {
        let config = KeyValueConfig::from_path(config_file)?;
        let forcing_file = config
            .get("forcing_file")
            .ok_or_else(|| CouplingError::MissingForcingFile {
                path: config_file.to_path_buf(),
            })?;

        Self::from_csv(Path::new(forcing_file), column)
    }

    /// Extract the ground temperature column from a forcing CSV file
    ///
    /// The first column holds the time and is never used.
    pub fn from_csv(path: &Path, column: &GroundTemperatureColumn) -> CouplingResult<Self> {
        let table = CsvTable::from_path(path)?;
        let index = match table.column_index(&column.column) {
            Some(index) => index,
            None => {
                debug!(
                    column = %column.column,
                    fallback = column.fallback_column_index,
                    "Ground temperature column not found, using fallback column"
                );
                column.fallback_column_index
            }
        };

        let values = table.column_values(index)?;
        info!(
            path = %path.display(),
            column = table.header().get(index).copied().unwrap_or_default(),
            steps = values.len(),
            "Loaded ground temperature series"
        );
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for a step index
    pub fn at(&self, step: usize) -> Option<FloatValue> {
        self.values.get(step).copied()
    }

    pub fn values(&self) -> &[FloatValue] {
        &self.values
    }

    /// Check that the series covers every step of the simulation
    pub fn ensure_covers(&self, steps: usize) -> CouplingResult<()> {
        if self.values.len() < steps {
            return Err(CouplingError::InsufficientForcing {
                available: self.values.len(),
                required: steps,
            });
        }
        Ok(())
    }
}
