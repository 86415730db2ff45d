//! Variable definitions shared by every coupled model.
//!
//! The keys used to exchange values between models are the wire contract between
//! the orchestrator and each model implementation, so they are defined once here
//! and referenced everywhere else.
//!
//! # Usage
//!
//! ```rust
//! use hydrocouple_core::standard_variables::VAR_PRECIPITATION_RATE;
//! use hydrocouple_core::variable::lookup;
//!
//! let var = lookup("atmosphere_water__liquid_equivalent_precipitation_rate").unwrap();
//! assert_eq!(var.unit, VAR_PRECIPITATION_RATE.unit);
//! ```

use serde::Serialize;

/// Definition of a variable exchanged between models.
///
/// Contains intrinsic metadata about a variable:
/// - Name (the exact key passed to `get_value`/`set_value`)
/// - Unit (canonical unit for the variable)
/// - Description (for documentation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariableDefinition {
    /// Exact key, including case and punctuation
    pub name: &'static str,
    /// Canonical unit
    pub unit: &'static str,
    /// Human-readable description
    pub description: &'static str,
}

/// Define a static variable definition.
///
/// ```rust,ignore
/// define_variable!(
///     VAR_SOIL_STORAGE,
///     name = "SOIL_STORAGE",
///     unit = "m",
///     description = "Water stored in the soil reservoir",
/// );
/// ```
#[macro_export]
macro_rules! define_variable {
    (
        $ident:ident,
        name = $name:expr,
        unit = $unit:expr,
        description = $description:expr $(,)?
    ) => {
        pub static $ident: $crate::variable::VariableDefinition =
            $crate::variable::VariableDefinition {
                name: $name,
                unit: $unit,
                description: $description,
            };
    };
}

/// Look up a standard variable by its key
pub fn lookup(name: &str) -> Option<&'static VariableDefinition> {
    crate::standard_variables::STANDARD_VARIABLES
        .iter()
        .copied()
        .find(|var| var.name == name)
}
