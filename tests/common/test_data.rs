//! Test data generation utilities.
//!
//! This module provides synthetic grid messages and message sources with
//! known data patterns, so pipeline tests can run without any GRIB files
//! or the ecCodes library.

use charney::error::Result;
use charney::extract::{GridMessage, MessageSource};
use ndarray::Array2;

/// Grid rows used by every fake message (latitudes 90 down to 87)
pub const ROWS: usize = 4;
/// Grid columns used by every fake message (longitudes 0 up to 4)
pub const COLS: usize = 5;

/// The level types ERA5 files use for the surface channels the fake
/// messages model; extraction tests register these as surface-like.
pub const SURFACE_LEVEL_TYPES: [&str; 3] = ["surface", "heightAboveGround", "meanSea"];

/// The latitude vector all fake grids share
pub fn latitudes() -> Vec<f64> {
    (0..ROWS).map(|j| 90.0 - j as f64).collect()
}

/// The longitude vector all fake grids share
pub fn longitudes() -> Vec<f64> {
    (0..COLS).map(|i| i as f64).collect()
}

/// A synthetic grid message with a constant fill value.
pub struct FakeMessage {
    pub code: u32,
    pub level: u32,
    pub level_type: String,
    pub rows: usize,
    pub cols: usize,
    pub fill: f64,
}

impl FakeMessage {
    fn new(code: u32, level: u32, level_type: &str, fill: f64) -> Self {
        Self {
            code,
            level,
            level_type: level_type.to_string(),
            rows: ROWS,
            cols: COLS,
            fill,
        }
    }

    /// A field on the surface coordinate
    pub fn surface(code: u32, fill: f64) -> Self {
        Self::new(code, 0, "surface", fill)
    }

    /// A field at a fixed height above ground, like 2 m temperature
    pub fn height(code: u32, level: u32, fill: f64) -> Self {
        Self::new(code, level, "heightAboveGround", fill)
    }

    /// A mean-sea-level field
    pub fn mean_sea(code: u32, fill: f64) -> Self {
        Self::new(code, 0, "meanSea", fill)
    }

    /// A field on an isobaric surface
    pub fn pressure(code: u32, level: u32, fill: f64) -> Self {
        Self::new(code, level, "isobaricInhPa", fill)
    }

    /// Override the grid shape, for shape-mismatch tests
    pub fn with_shape(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }
}

impl GridMessage for FakeMessage {
    fn param_code(&self) -> Result<u32> {
        Ok(self.code)
    }

    fn level(&self) -> Result<u32> {
        Ok(self.level)
    }

    fn level_type(&self) -> Result<String> {
        Ok(self.level_type.clone())
    }

    fn grids(&self) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>)> {
        let shape = (self.rows, self.cols);
        let lats = Array2::from_shape_fn(shape, |(j, _)| 90.0 - j as f64);
        let lons = Array2::from_shape_fn(shape, |(_, i)| i as f64);
        let values = Array2::from_elem(shape, self.fill);
        Ok((lons, lats, values))
    }
}

/// A message source that replays a vector of fake messages.
pub struct FakeSource {
    messages: Vec<FakeMessage>,
    cursor: usize,
}

impl FakeSource {
    pub fn new(messages: Vec<FakeMessage>) -> Self {
        Self {
            messages,
            cursor: 0,
        }
    }
}

impl MessageSource for FakeSource {
    type Msg = FakeMessage;

    fn next_message(&mut self) -> Result<Option<&FakeMessage>> {
        let next = self.messages.get(self.cursor);
        if next.is_some() {
            self.cursor += 1;
        }
        Ok(next)
    }
}
