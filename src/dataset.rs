//! Channel stacks and selection from labeled datasets.
//!
//! The extraction pipeline produces a [`ChannelStack`]: a dense
//! `[channel, latitude, longitude]` array plus the coordinate vectors and
//! the descriptor list that names each leading slice. The same shape can
//! also be pulled out of an already-decoded [`LabeledDataset`] with
//! [`LabeledDataset::select`], matching variables by one of the two naming
//! conventions the archive uses for its files.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayViewD, Axis, Ix2};
use serde::{Deserialize, Serialize};

use crate::error::{CharneyError, Result};
use crate::variables::{Variable, VariableTable};

/// Name of the latitude dimension in labeled datasets
pub const DIM_LATITUDE: &str = "latitude";
/// Name of the longitude dimension in labeled datasets
pub const DIM_LONGITUDE: &str = "longitude";
/// Name of the vertical dimension in labeled datasets
pub const DIM_LEVEL: &str = "level";

/// Tolerance for matching a requested pressure level against the level
/// coordinate, which is stored as floating point.
const LEVEL_MATCH_TOLERANCE: f64 = 1e-6;

/// A channel-ordered stack of grids.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStack {
    /// Descriptor for each slice along the leading axis
    pub channels: Vec<Variable>,
    /// Values shaped `[channel, latitude, longitude]`
    pub values: Array3<f64>,
    /// Latitude per grid row
    pub latitudes: Vec<f64>,
    /// Longitude per grid column
    pub longitudes: Vec<f64>,
}

impl ChannelStack {
    /// The `(channels, rows, cols)` shape of the stack
    pub fn dim(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    /// Channel spellings in stack order
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(Variable::channel).collect()
    }

    /// Position of a descriptor along the channel axis
    pub fn index_of(&self, var: &Variable) -> Option<usize> {
        self.channels.iter().position(|channel| channel == var)
    }

    /// The 2-D grid of one channel
    pub fn channel(&self, var: &Variable) -> Option<ArrayView2<'_, f64>> {
        self.index_of(var)
            .map(|index| self.values.index_axis(Axis(0), index))
    }
}

/// How a dataset names its variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// Archive long names, e.g. "2m_temperature", "geopotential"
    Era5Name,
    /// In-file short names, e.g. "t2m", "z"
    ShortName,
}

impl FromStr for NamingConvention {
    type Err = CharneyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "era5_name" => Ok(NamingConvention::Era5Name),
            "short_name" => Ok(NamingConvention::ShortName),
            other => Err(CharneyError::Configuration {
                message: format!(
                    "unknown naming convention '{}' (expected 'era5_name' or 'short_name')",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingConvention::Era5Name => write!(f, "era5_name"),
            NamingConvention::ShortName => write!(f, "short_name"),
        }
    }
}

/// One named variable of a labeled dataset.
#[derive(Debug, Clone)]
pub struct GridVariable {
    /// Dimension names, one per axis of `values`
    pub dims: Vec<String>,
    /// The data, with one axis per entry of `dims`
    pub values: ArrayD<f64>,
}

/// An in-memory dataset of named variables over named coordinates.
///
/// This is the crate's view of an already-decoded file: coordinates are
/// 1-D vectors keyed by dimension name, variables carry their dimension
/// names alongside the data. Only what selection needs is modeled.
#[derive(Debug, Clone, Default)]
pub struct LabeledDataset {
    coords: HashMap<String, Vec<f64>>,
    variables: HashMap<String, GridVariable>,
}

impl LabeledDataset {
    /// An empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a coordinate vector, consuming and returning the dataset
    pub fn with_coord(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.coords.insert(name.into(), values);
        self
    }

    /// Add a variable, validating its dimensions against the coordinates.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        dims: &[&str],
        values: ArrayD<f64>,
    ) -> Result<()> {
        let name = name.into();
        if dims.len() != values.ndim() {
            return Err(CharneyError::ShapeMismatch {
                message: format!(
                    "variable '{}' has {} dimension names but {} axes",
                    name,
                    dims.len(),
                    values.ndim()
                ),
            });
        }
        for (dim, &extent) in dims.iter().zip(values.shape()) {
            let coord = self.coords.get(*dim).ok_or_else(|| CharneyError::Configuration {
                message: format!("variable '{}' uses undefined dimension '{}'", name, dim),
            })?;
            if coord.len() != extent {
                return Err(CharneyError::ShapeMismatch {
                    message: format!(
                        "variable '{}' extent {} along '{}' does not match coordinate length {}",
                        name,
                        extent,
                        dim,
                        coord.len()
                    ),
                });
            }
        }
        self.variables.insert(
            name,
            GridVariable {
                dims: dims.iter().map(|d| d.to_string()).collect(),
                values,
            },
        );
        Ok(())
    }

    /// Read a coordinate vector
    pub fn coord(&self, name: &str) -> Option<&[f64]> {
        self.coords.get(name).map(Vec::as_slice)
    }

    /// Read a variable
    pub fn variable(&self, name: &str) -> Option<&GridVariable> {
        self.variables.get(name)
    }

    /// Pull the requested channels out of the dataset as a stack.
    ///
    /// Each descriptor is looked up under the name the convention assigns
    /// it; pressure-level descriptors additionally select their level from
    /// the `level_dim` dimension (datasets disagree on what to call it;
    /// [`DIM_LEVEL`] is the usual spelling). Grids stored
    /// `[longitude, latitude]` are transposed so every slice of the result
    /// is `[latitude, longitude]`.
    pub fn select(
        &self,
        vars: &[Variable],
        table: &VariableTable,
        level_dim: &str,
        convention: NamingConvention,
    ) -> Result<ChannelStack> {
        if vars.is_empty() {
            return Err(CharneyError::EmptyChannelList);
        }

        let latitudes = self
            .coords
            .get(DIM_LATITUDE)
            .cloned()
            .ok_or_else(|| CharneyError::DataNotFound {
                message: format!("dataset has no '{}' coordinate", DIM_LATITUDE),
            })?;
        let longitudes = self
            .coords
            .get(DIM_LONGITUDE)
            .cloned()
            .ok_or_else(|| CharneyError::DataNotFound {
                message: format!("dataset has no '{}' coordinate", DIM_LONGITUDE),
            })?;

        let mut grids = Vec::with_capacity(vars.len());
        for var in vars {
            let name = match convention {
                NamingConvention::Era5Name => table.archive_name(var)?,
                NamingConvention::ShortName => table.short_name(var)?,
            };
            let variable = self.variables.get(name).ok_or_else(|| {
                CharneyError::DataNotFound {
                    message: format!("dataset has no variable '{}' for channel {}", name, var),
                }
            })?;
            let grid = self.grid_2d(variable, name, level_dim, var.level())?;
            if grid.dim() != (latitudes.len(), longitudes.len()) {
                return Err(CharneyError::ShapeMismatch {
                    message: format!(
                        "grid for '{}' is {:?}, expected ({}, {})",
                        name,
                        grid.dim(),
                        latitudes.len(),
                        longitudes.len()
                    ),
                });
            }
            grids.push(grid);
        }

        let views: Vec<_> = grids.iter().map(|grid| grid.view()).collect();
        let values = ndarray::stack(Axis(0), &views).map_err(|err| CharneyError::ShapeMismatch {
            message: err.to_string(),
        })?;

        Ok(ChannelStack {
            channels: vars.to_vec(),
            values,
            latitudes,
            longitudes,
        })
    }

    /// Reduce one variable to a `[latitude, longitude]` grid, selecting a
    /// level first when asked for one.
    fn grid_2d(
        &self,
        variable: &GridVariable,
        name: &str,
        level_dim: &str,
        level: Option<u32>,
    ) -> Result<Array2<f64>> {
        let (dims, view): (Vec<&str>, ArrayViewD<'_, f64>) = match level {
            None => (
                variable.dims.iter().map(String::as_str).collect(),
                variable.values.view(),
            ),
            Some(level) => {
                let axis = variable
                    .dims
                    .iter()
                    .position(|dim| dim == level_dim)
                    .ok_or_else(|| CharneyError::DataNotFound {
                        message: format!(
                            "variable '{}' has no '{}' dimension",
                            name, level_dim
                        ),
                    })?;
                let levels =
                    self.coords
                        .get(level_dim)
                        .ok_or_else(|| CharneyError::DataNotFound {
                            message: format!("dataset has no '{}' coordinate", level_dim),
                        })?;
                let target = f64::from(level);
                let index = levels
                    .iter()
                    .position(|&l| (l - target).abs() <= LEVEL_MATCH_TOLERANCE)
                    .ok_or_else(|| CharneyError::DataNotFound {
                        message: format!("level {} is not present for variable '{}'", level, name),
                    })?;
                let dims = variable
                    .dims
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != axis)
                    .map(|(_, dim)| dim.as_str())
                    .collect();
                (dims, variable.values.index_axis(Axis(axis), index))
            }
        };

        if dims.len() != 2 {
            return Err(CharneyError::ShapeMismatch {
                message: format!(
                    "variable '{}' reduces to {} dimensions {:?}, expected 2",
                    name,
                    dims.len(),
                    dims
                ),
            });
        }
        let grid = view
            .into_dimensionality::<Ix2>()
            .map_err(|err| CharneyError::ShapeMismatch {
                message: err.to_string(),
            })?;

        if dims == [DIM_LATITUDE, DIM_LONGITUDE] {
            Ok(grid.to_owned())
        } else if dims == [DIM_LONGITUDE, DIM_LATITUDE] {
            Ok(grid.t().to_owned())
        } else {
            Err(CharneyError::ShapeMismatch {
                message: format!(
                    "variable '{}' has dimensions {:?}, expected latitude/longitude",
                    name, dims
                ),
            })
        }
    }
}
