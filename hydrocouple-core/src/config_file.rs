//! Reader for the `key=value` configuration files used by the coupled models.
//!
//! Each line holds one `key=value` pair. Blank lines and lines starting with `#`
//! are ignored. Numeric values may carry a bracketed unit suffix such as
//! `3600[s]` or `0.1[m]`, and lists are comma separated.

use crate::errors::{CouplingError, CouplingResult};
use crate::value::FloatValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Parsed `key=value` configuration file
#[derive(Debug, Clone)]
pub struct KeyValueConfig {
    path: PathBuf,
    entries: HashMap<String, (usize, String)>,
}

impl KeyValueConfig {
    /// Read and parse a configuration file
    pub fn from_path(path: &Path) -> CouplingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CouplingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse configuration content
    ///
    /// `path` is only used to give context in error messages.
    pub fn parse(content: &str, path: &Path) -> CouplingResult<Self> {
        let mut entries = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (key, value) = trimmed.split_once('=').ok_or_else(|| CouplingError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message: format!("expected key=value, got '{}'", trimmed),
            })?;

            // The first occurrence of a key wins
            entries
                .entry(key.trim().to_string())
                .or_insert_with(|| (index + 1, value.trim().to_string()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Raw value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|(_, value)| value.as_str())
    }

    /// Raw value for a key that must be present
    pub fn require(&self, key: &str) -> CouplingResult<&str> {
        self.get(key).ok_or_else(|| {
            CouplingError::Config(format!(
                "{} does not provide {}",
                self.path.display(),
                key
            ))
        })
    }

    /// Value parsed into `T`, with any unit suffix removed
    pub fn parse_value<T: FromStr>(&self, key: &str) -> CouplingResult<Option<T>> {
        let Some((line, raw)) = self.entries.get(key) else {
            return Ok(None);
        };
        let (number, _) = split_unit(raw);
        number
            .parse::<T>()
            .map(Some)
            .map_err(|_| self.parse_error(*line, key, raw))
    }

    /// Value parsed into `T`, falling back to `default` when the key is absent
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> CouplingResult<T> {
        Ok(self.parse_value(key)?.unwrap_or(default))
    }

    /// Value parsed into `T` for a key that must be present
    pub fn parse_required<T: FromStr>(&self, key: &str) -> CouplingResult<T> {
        self.require(key)?;
        self.parse_value(key)?
            .ok_or_else(|| CouplingError::Config(format!("missing {}", key)))
    }

    /// Time value converted to seconds
    ///
    /// Accepts the `s`, `min`, `h` and `d` unit suffixes. Values without a suffix are seconds.
    pub fn parse_seconds(&self, key: &str) -> CouplingResult<Option<FloatValue>> {
        let Some((line, raw)) = self.entries.get(key) else {
            return Ok(None);
        };
        let (number, unit) = split_unit(raw);
        let value: FloatValue = number
            .parse()
            .map_err(|_| self.parse_error(*line, key, raw))?;
        let factor = match unit {
            None | Some("s") | Some("sec") => 1.0,
            Some("min") => 60.0,
            Some("h") | Some("hr") => 3600.0,
            Some("d") | Some("day") => 86400.0,
            Some(other) => {
                return Err(CouplingError::Parse {
                    path: self.path.clone(),
                    line: *line,
                    message: format!("unsupported time unit '{}' for {}", other, key),
                })
            }
        };
        Ok(Some(value * factor))
    }

    /// Comma separated list of floats
    pub fn parse_list(&self, key: &str) -> CouplingResult<Option<Vec<FloatValue>>> {
        let Some((line, raw)) = self.entries.get(key) else {
            return Ok(None);
        };
        let (list, _) = split_unit(raw);
        list.split(',')
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse::<FloatValue>()
                    .map_err(|_| self.parse_error(*line, key, raw))
            })
            .collect::<CouplingResult<Vec<_>>>()
            .map(Some)
    }

    fn parse_error(&self, line: usize, key: &str, raw: &str) -> CouplingError {
        CouplingError::Parse {
            path: self.path.clone(),
            line,
            message: format!("invalid value '{}' for {}", raw, key),
        }
    }
}

/// Split `0.1[m]` into `("0.1", Some("m"))`
fn split_unit(raw: &str) -> (&str, Option<&str>) {
    match raw.find('[') {
        Some(start) => {
            let unit = raw[start + 1..].trim_end_matches(']').trim();
            (raw[..start].trim(), Some(unit))
        }
        None => (raw.trim(), None),
    }
}
