//! The built-in ERA5 code table.
//!
//! Codes follow the ECMWF parameter database; names follow the archive's
//! request vocabulary, so `archive_name` is what goes into a retrieval
//! request and `short_name` is what the delivered files call the variable.

use super::{VariableDef, VariableTable};

/// Definition rows for the ERA5 variables this crate knows about.
pub fn era5_defs() -> Vec<VariableDef> {
    vec![
        // Surface / single-level fields
        VariableDef::surface(165, "u10m", "10m_u_component_of_wind", "u10", "m s**-1"),
        VariableDef::surface(166, "v10m", "10m_v_component_of_wind", "v10", "m s**-1"),
        VariableDef::surface(228246, "u100m", "100m_u_component_of_wind", "u100", "m s**-1"),
        VariableDef::surface(228247, "v100m", "100m_v_component_of_wind", "v100", "m s**-1"),
        VariableDef::surface(167, "t2m", "2m_temperature", "t2m", "K"),
        VariableDef::surface(134, "sp", "surface_pressure", "sp", "Pa"),
        VariableDef::surface(151, "msl", "mean_sea_level_pressure", "msl", "Pa"),
        VariableDef::surface(137, "tcwv", "total_column_water_vapour", "tcwv", "kg m**-2"),
        // Pressure-level families
        VariableDef::pressure(129, "z", "geopotential", "z", "m**2 s**-2"),
        VariableDef::pressure(130, "t", "temperature", "t", "K"),
        VariableDef::pressure(131, "u", "u_component_of_wind", "u", "m s**-1"),
        VariableDef::pressure(132, "v", "v_component_of_wind", "v", "m s**-1"),
        VariableDef::pressure(133, "q", "specific_humidity", "q", "kg kg**-1"),
        VariableDef::pressure(157, "r", "relative_humidity", "r", "%"),
    ]
}

impl VariableTable {
    /// The built-in ERA5 table.
    pub fn era5() -> Self {
        // The rows above have unique names and codes; a failure here is a
        // bug in this file, not a runtime condition.
        Self::new(era5_defs()).expect("builtin ERA5 table is consistent")
    }
}
