//! Standard variables exchanged between the coupled models.
//!
//! Names follow the CSDMS standard names where the models use them and the
//! model-specific upper-case names otherwise. They must match the model
//! implementations exactly.
//!
//! # Available Variables
//!
//! ## Meteorological forcing
//! - `VAR_AIR_TEMPERATURE`, `VAR_AIR_PRESSURE`, `VAR_RELATIVE_HUMIDITY`
//! - `VAR_PRECIPITATION_RATE`
//! - `VAR_SHORTWAVE_RADIATION`, `VAR_LONGWAVE_RADIATION`
//! - `VAR_WIND_U`, `VAR_WIND_V`
//!
//! ## Evapotranspiration
//! - `VAR_POTENTIAL_ET`
//!
//! ## Runoff
//! - `VAR_SURFACE_RUNOFF_SCHEME`, `VAR_SOIL_STORAGE`, `VAR_SOIL_STORAGE_CHANGE`
//! - `VAR_ICE_FRACTION_SCHAAKE`, `VAR_ICE_FRACTION_XINANJIANG`
//! - `VAR_SURFACE_RUNOFF`
//!
//! ## Freeze-thaw
//! - `VAR_ICE_FRACTION_SCHEME`, `VAR_GROUND_TEMPERATURE`, `VAR_NUM_CELLS`
//! - `VAR_SOIL_TEMPERATURE_PROFILE`
//!
//! ## Soil moisture profile
//! - `VAR_SOIL_STORAGE_SMP`, `VAR_SOIL_STORAGE_CHANGE_SMP`
//! - `VAR_SOIL_MOISTURE_METHOD`, `VAR_SOIL_MOISTURE_LAYERED`, `VAR_SOIL_MOISTURE_PROFILE`

use crate::define_variable;
use crate::variable::VariableDefinition;

// ============================================================================
// Meteorological forcing
// ============================================================================

define_variable!(
    VAR_AIR_TEMPERATURE,
    name = "land_surface_air__temperature",
    unit = "K",
    description = "Near-surface (2 m) air temperature",
);

define_variable!(
    VAR_AIR_PRESSURE,
    name = "land_surface_air__pressure",
    unit = "Pa",
    description = "Surface air pressure",
);

define_variable!(
    VAR_RELATIVE_HUMIDITY,
    name = "atmosphere_air_water~vapor__relative_saturation",
    unit = "1",
    description = "Relative humidity of near-surface air",
);

define_variable!(
    VAR_PRECIPITATION_RATE,
    name = "atmosphere_water__liquid_equivalent_precipitation_rate",
    unit = "mm s-1",
    description = "Liquid-equivalent precipitation rate",
);

define_variable!(
    VAR_SHORTWAVE_RADIATION,
    name = "land_surface_radiation~incoming~shortwave__energy_flux",
    unit = "W m-2",
    description = "Incoming shortwave radiation at the surface",
);

define_variable!(
    VAR_LONGWAVE_RADIATION,
    name = "land_surface_radiation~incoming~longwave__energy_flux",
    unit = "W m-2",
    description = "Incoming longwave radiation at the surface",
);

define_variable!(
    VAR_WIND_U,
    name = "land_surface_wind__x_component_of_velocity",
    unit = "m s-1",
    description = "Eastward 10 m wind speed",
);

define_variable!(
    VAR_WIND_V,
    name = "land_surface_wind__y_component_of_velocity",
    unit = "m s-1",
    description = "Northward 10 m wind speed",
);

// ============================================================================
// Evapotranspiration
// ============================================================================

define_variable!(
    VAR_POTENTIAL_ET,
    name = "water_potential_evaporation_flux",
    unit = "m s-1",
    description = "Potential evapotranspiration rate",
);

// ============================================================================
// Runoff
// ============================================================================

define_variable!(
    VAR_SURFACE_RUNOFF_SCHEME,
    name = "SURF_RUNOFF_SCHEME",
    unit = "1",
    description = "Surface runoff partitioning scheme (1 = Schaake, 2 = Xinanjiang)",
);

define_variable!(
    VAR_SOIL_STORAGE,
    name = "SOIL_STORAGE",
    unit = "m",
    description = "Water stored in the soil reservoir",
);

define_variable!(
    VAR_SOIL_STORAGE_CHANGE,
    name = "SOIL_STORAGE_CHANGE",
    unit = "m",
    description = "Change in soil reservoir storage over the last step",
);

define_variable!(
    VAR_ICE_FRACTION_SCHAAKE,
    name = "ice_fraction_schaake",
    unit = "m",
    description = "Frozen water content used by the Schaake infiltration scheme",
);

define_variable!(
    VAR_ICE_FRACTION_XINANJIANG,
    name = "ice_fraction_xinan",
    unit = "1",
    description = "Frozen fraction of the top soil cell used by the Xinanjiang scheme",
);

define_variable!(
    VAR_SURFACE_RUNOFF,
    name = "land_surface_water__runoff_depth",
    unit = "m",
    description = "Surface runoff generated over the last step",
);

// ============================================================================
// Freeze-thaw
// ============================================================================

define_variable!(
    VAR_ICE_FRACTION_SCHEME,
    name = "ice_fraction_scheme_bmi",
    unit = "1",
    description = "Scheme under which ice fraction is reported (1 = Schaake, 2 = Xinanjiang)",
);

define_variable!(
    VAR_GROUND_TEMPERATURE,
    name = "ground_temperature",
    unit = "K",
    description = "Ground surface temperature boundary condition",
);

define_variable!(
    VAR_NUM_CELLS,
    name = "num_cells",
    unit = "1",
    description = "Number of soil cells in the freeze-thaw column",
);

define_variable!(
    VAR_SOIL_TEMPERATURE_PROFILE,
    name = "soil_temperature_profile",
    unit = "K",
    description = "Soil temperature of each cell",
);

// ============================================================================
// Soil moisture profile
// ============================================================================

define_variable!(
    VAR_SOIL_STORAGE_SMP,
    name = "soil_storage",
    unit = "m",
    description = "Soil reservoir storage received from the runoff model",
);

define_variable!(
    VAR_SOIL_STORAGE_CHANGE_SMP,
    name = "soil_storage_change",
    unit = "m",
    description = "Soil reservoir storage change received from the runoff model",
);

define_variable!(
    VAR_SOIL_MOISTURE_METHOD,
    name = "soil_storage_model",
    unit = "1",
    description = "Soil moisture profile method (1 = constant, 2 = layered)",
);

define_variable!(
    VAR_SOIL_MOISTURE_LAYERED,
    name = "soil_moisture_layered",
    unit = "1",
    description = "Volumetric moisture fraction of each conceptual soil layer",
);

define_variable!(
    VAR_SOIL_MOISTURE_PROFILE,
    name = "soil_moisture_profile",
    unit = "1",
    description = "Volumetric soil moisture of each freeze-thaw cell",
);

/// Every standard variable, in declaration order
pub static STANDARD_VARIABLES: &[&VariableDefinition] = &[
    &VAR_AIR_TEMPERATURE,
    &VAR_AIR_PRESSURE,
    &VAR_RELATIVE_HUMIDITY,
    &VAR_PRECIPITATION_RATE,
    &VAR_SHORTWAVE_RADIATION,
    &VAR_LONGWAVE_RADIATION,
    &VAR_WIND_U,
    &VAR_WIND_V,
    &VAR_POTENTIAL_ET,
    &VAR_SURFACE_RUNOFF_SCHEME,
    &VAR_SOIL_STORAGE,
    &VAR_SOIL_STORAGE_CHANGE,
    &VAR_ICE_FRACTION_SCHAAKE,
    &VAR_ICE_FRACTION_XINANJIANG,
    &VAR_SURFACE_RUNOFF,
    &VAR_ICE_FRACTION_SCHEME,
    &VAR_GROUND_TEMPERATURE,
    &VAR_NUM_CELLS,
    &VAR_SOIL_TEMPERATURE_PROFILE,
    &VAR_SOIL_STORAGE_SMP,
    &VAR_SOIL_STORAGE_CHANGE_SMP,
    &VAR_SOIL_MOISTURE_METHOD,
    &VAR_SOIL_MOISTURE_LAYERED,
    &VAR_SOIL_MOISTURE_PROFILE,
];

/// The eight quantities the forcing model supplies to evapotranspiration
pub static MET_FORCING_VARIABLES: [&VariableDefinition; 8] = [
    &VAR_AIR_TEMPERATURE,
    &VAR_AIR_PRESSURE,
    &VAR_RELATIVE_HUMIDITY,
    &VAR_PRECIPITATION_RATE,
    &VAR_SHORTWAVE_RADIATION,
    &VAR_LONGWAVE_RADIATION,
    &VAR_WIND_U,
    &VAR_WIND_V,
];
