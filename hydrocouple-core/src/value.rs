use crate::errors::{CouplingError, CouplingResult};
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;
/// Simulation time in seconds since the start of the run.
pub type Time = f64;

/// A value exchanged between coupled models
///
/// Variables are either scalars, integer option codes (e.g. the surface runoff scheme)
/// or small fixed-length vectors such as a per-cell soil moisture profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariableValue {
    /// A single floating point quantity
    Scalar(FloatValue),
    /// An integer code or count
    Integer(i64),
    /// A per-layer or per-cell quantity
    Vector(Vec<FloatValue>),
}

impl VariableValue {
    /// Name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            VariableValue::Scalar(_) => "scalar",
            VariableValue::Integer(_) => "integer",
            VariableValue::Vector(_) => "vector",
        }
    }

    /// Get the scalar value if this is a Scalar variant
    pub fn as_scalar(&self) -> Option<FloatValue> {
        match self {
            VariableValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the integer value if this is an Integer variant
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            VariableValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the values if this is a Vector variant
    pub fn as_vector(&self) -> Option<&[FloatValue]> {
        match self {
            VariableValue::Vector(values) => Some(values),
            _ => None,
        }
    }

    /// Number of elements carried by the value
    ///
    /// Scalars and integers count as a single element.
    pub fn len(&self) -> usize {
        match self {
            VariableValue::Vector(values) => values.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extract a scalar, reporting the component and key on a type mismatch
    pub fn expect_scalar(&self, component: &str, key: &str) -> CouplingResult<FloatValue> {
        self.as_scalar()
            .ok_or_else(|| self.type_error(component, key, "scalar"))
    }

    /// Extract an integer, reporting the component and key on a type mismatch
    pub fn expect_integer(&self, component: &str, key: &str) -> CouplingResult<i64> {
        self.as_integer()
            .ok_or_else(|| self.type_error(component, key, "integer"))
    }

    /// Extract a vector, reporting the component and key on a type mismatch
    pub fn expect_vector(&self, component: &str, key: &str) -> CouplingResult<&[FloatValue]> {
        match self {
            VariableValue::Vector(values) => Ok(values),
            _ => Err(self.type_error(component, key, "vector")),
        }
    }

    fn type_error(&self, component: &str, key: &str, expected: &'static str) -> CouplingError {
        CouplingError::WrongValueType {
            component: component.to_string(),
            key: key.to_string(),
            expected,
            found: self.kind(),
        }
    }
}

impl From<FloatValue> for VariableValue {
    fn from(value: FloatValue) -> Self {
        VariableValue::Scalar(value)
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        VariableValue::Integer(value)
    }
}

impl From<Vec<FloatValue>> for VariableValue {
    fn from(values: Vec<FloatValue>) -> Self {
        VariableValue::Vector(values)
    }
}
