//! Option codes that select how the coupled models exchange data.
//!
//! The models report these as integer codes through their variable interface.
//! They are decoded into closed enums so that every branch point matches exhaustively
//! and an unknown code is rejected instead of silently falling through.

use crate::errors::CouplingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Surface runoff partitioning scheme declared by the runoff model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunoffScheme {
    /// Schaake infiltration excess, reduced by frozen water content
    Schaake,
    /// Xinanjiang variable source area, with the frozen top cell acting as impervious area
    Xinanjiang,
}

impl RunoffScheme {
    pub fn code(self) -> i64 {
        match self {
            RunoffScheme::Schaake => 1,
            RunoffScheme::Xinanjiang => 2,
        }
    }
}

impl TryFrom<i64> for RunoffScheme {
    type Error = CouplingError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(RunoffScheme::Schaake),
            2 => Ok(RunoffScheme::Xinanjiang),
            other => Err(CouplingError::UnknownRunoffScheme(other)),
        }
    }
}

impl fmt::Display for RunoffScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunoffScheme::Schaake => write!(f, "Schaake"),
            RunoffScheme::Xinanjiang => write!(f, "Xinanjiang"),
        }
    }
}

/// Method the soil moisture profile model uses to build its profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilMoistureMethod {
    /// Uniform moisture derived from the bulk soil storage
    Constant,
    /// Linear interpolation between conceptual layers
    Layered,
}

impl SoilMoistureMethod {
    pub fn code(self) -> i64 {
        match self {
            SoilMoistureMethod::Constant => 1,
            SoilMoistureMethod::Layered => 2,
        }
    }
}

impl TryFrom<i64> for SoilMoistureMethod {
    type Error = CouplingError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(SoilMoistureMethod::Constant),
            2 => Ok(SoilMoistureMethod::Layered),
            other => Err(CouplingError::UnknownSoilMoistureMethod(other)),
        }
    }
}

impl fmt::Display for SoilMoistureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoilMoistureMethod::Constant => write!(f, "constant"),
            SoilMoistureMethod::Layered => write!(f, "layered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runoff_scheme_codes() {
        assert_eq!(RunoffScheme::try_from(1).unwrap(), RunoffScheme::Schaake);
        assert_eq!(RunoffScheme::try_from(2).unwrap(), RunoffScheme::Xinanjiang);
        for scheme in [RunoffScheme::Schaake, RunoffScheme::Xinanjiang] {
            assert_eq!(RunoffScheme::try_from(scheme.code()).unwrap(), scheme);
        }
    }

    #[test]
    fn test_unknown_codes_are_rejected() {
        for code in [-1, 0, 3, 42] {
            assert!(matches!(
                RunoffScheme::try_from(code),
                Err(CouplingError::UnknownRunoffScheme(c)) if c == code
            ));
            assert!(matches!(
                SoilMoistureMethod::try_from(code),
                Err(CouplingError::UnknownSoilMoistureMethod(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_soil_moisture_method_codes() {
        assert_eq!(
            SoilMoistureMethod::try_from(1).unwrap(),
            SoilMoistureMethod::Constant
        );
        assert_eq!(
            SoilMoistureMethod::try_from(2).unwrap(),
            SoilMoistureMethod::Layered
        );
    }
}
