//! Streaming extraction of requested channels from grid message sources.
//!
//! A [`GribExtractor`] walks every message in one or more sources, matches
//! each message against the requested descriptors by archive code and level,
//! and accumulates the matching grids into a channel-ordered stack. Messages
//! for fields nobody asked for are skipped; a repeated field overwrites its
//! earlier grid; and extraction fails if any requested channel is still
//! unfilled once the sources run dry.

pub mod source;

#[cfg(feature = "eccodes")]
pub mod eccodes;

pub use source::{GridMessage, MessageSource};

#[cfg(feature = "eccodes")]
pub use self::eccodes::EccodesSource;

use std::collections::HashMap;

use ndarray::{Array2, Axis};
use tracing::{debug, info, warn};

use crate::dataset::ChannelStack;
use crate::error::{CharneyError, Result};
use crate::variables::{Variable, VariableTable};

/// Level types classified as surface fields unless overridden
pub const DEFAULT_SURFACE_LEVEL_TYPES: [&str; 1] = ["surface"];

/// Level types classified as pressure-level fields unless overridden
pub const DEFAULT_PRESSURE_LEVEL_TYPES: [&str; 1] = ["isobaricInhPa"];

/// Matches grid messages against requested descriptors and stacks the
/// results.
///
/// The extractor owns the variable table used to turn `(code, level)` pairs
/// back into descriptors, plus the sets of level types it treats as surface
/// and pressure coordinates. Messages with any other level type (model
/// levels, soil layers, ...) are skipped with a debug log line.
#[derive(Debug, Clone)]
pub struct GribExtractor {
    table: VariableTable,
    surface_level_types: Vec<String>,
    pressure_level_types: Vec<String>,
}

impl GribExtractor {
    /// An extractor over the given table with the default level-type
    /// classification.
    pub fn new(table: VariableTable) -> Self {
        Self {
            table,
            surface_level_types: DEFAULT_SURFACE_LEVEL_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pressure_level_types: DEFAULT_PRESSURE_LEVEL_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the level types classified as surface fields.
    ///
    /// Archives label some surface channels with other level types
    /// ("heightAboveGround" for the 2 m and 10 m fields, "meanSea" for
    /// mean sea level pressure); register those here to match them.
    pub fn with_surface_level_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.surface_level_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the level types classified as pressure-level fields
    pub fn with_pressure_level_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pressure_level_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Extract the requested channels from a sequence of message sources.
    ///
    /// Sources are drained in order and dropped as soon as they are
    /// exhausted, so at most one stays open past its last message. The
    /// result stacks grids along a new leading axis in the order of `vars`;
    /// latitude and longitude vectors come from the first matched message.
    pub fn extract<S, I>(&self, vars: &[Variable], sources: I) -> Result<ChannelStack>
    where
        S: MessageSource,
        I: IntoIterator<Item = S>,
    {
        if vars.is_empty() {
            return Err(CharneyError::EmptyChannelList);
        }

        // First occurrence wins when the same descriptor is requested twice;
        // the duplicate slot stays empty and fails the completeness check.
        let mut index: HashMap<&Variable, usize> = HashMap::new();
        for (i, var) in vars.iter().enumerate() {
            index.entry(var).or_insert(i);
        }

        let mut acc = Accumulator::new(vars.len());
        for mut source in sources {
            self.drain(&mut source, &index, &mut acc)?;
        }

        let stack = acc.finish(vars)?;
        info!(
            channels = stack.channels.len(),
            rows = stack.latitudes.len(),
            cols = stack.longitudes.len(),
            "extracted channel stack"
        );
        Ok(stack)
    }

    /// Walk one source to exhaustion, recording every matching message.
    fn drain<S: MessageSource>(
        &self,
        source: &mut S,
        index: &HashMap<&Variable, usize>,
        acc: &mut Accumulator,
    ) -> Result<()> {
        while let Some(message) = source.next_message()? {
            let code = message.param_code()?;
            let level_type = message.level_type()?;

            let candidate = if self.pressure_level_types.contains(&level_type) {
                let level = message.level()?;
                self.table.pressure_by_code(code, level)
            } else if self.surface_level_types.contains(&level_type) {
                self.table.surface_by_code(code)
            } else {
                debug!(code, level_type = %level_type, "skipping message with unclassified level type");
                continue;
            };

            let var = match candidate {
                Some(var) => var,
                None => {
                    debug!(code, level_type = %level_type, "skipping message with code not in table");
                    continue;
                }
            };

            let slot = match index.get(&var) {
                Some(&slot) => slot,
                None => {
                    debug!(channel = %var, "skipping field not in the requested channels");
                    continue;
                }
            };

            let (lons, lats, values) = message.grids()?;
            acc.record(slot, &var, lons, lats, values)?;
        }
        Ok(())
    }
}

/// Collects matched grids and the shared grid geometry.
#[derive(Debug)]
struct Accumulator {
    slots: Vec<Option<Array2<f64>>>,
    latitudes: Option<Vec<f64>>,
    longitudes: Option<Vec<f64>>,
    shape: Option<(usize, usize)>,
}

impl Accumulator {
    fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
            latitudes: None,
            longitudes: None,
            shape: None,
        }
    }

    /// Record one matched grid, capturing coordinates from the first one
    /// and enforcing a single grid shape across all of them.
    fn record(
        &mut self,
        slot: usize,
        var: &Variable,
        lons: Array2<f64>,
        lats: Array2<f64>,
        values: Array2<f64>,
    ) -> Result<()> {
        let dim = values.dim();
        if lats.dim() != dim || lons.dim() != dim {
            return Err(CharneyError::ShapeMismatch {
                message: format!(
                    "coordinate grids {:?}/{:?} do not match value grid {:?} for {}",
                    lats.dim(),
                    lons.dim(),
                    dim,
                    var
                ),
            });
        }
        if dim.0 == 0 || dim.1 == 0 {
            return Err(CharneyError::ShapeMismatch {
                message: format!("{} grid has a zero extent: {:?}", var, dim),
            });
        }

        match self.shape {
            None => {
                self.shape = Some(dim);
                // lat varies along rows, lon along columns
                self.latitudes = Some(lats.column(0).to_vec());
                self.longitudes = Some(lons.row(0).to_vec());
            }
            Some(expected) if expected != dim => {
                return Err(CharneyError::ShapeMismatch {
                    message: format!("{} grid is {:?}, expected {:?}", var, dim, expected),
                });
            }
            Some(_) => {}
        }

        if self.slots[slot].is_some() {
            debug!(channel = %var, "field appears more than once, keeping the later grid");
        }
        self.slots[slot] = Some(values);
        Ok(())
    }

    fn finish(self, vars: &[Variable]) -> Result<ChannelStack> {
        let Accumulator {
            slots,
            latitudes,
            longitudes,
            ..
        } = self;

        let mut grids = Vec::with_capacity(vars.len());
        let mut missing = Vec::new();
        for (var, slot) in vars.iter().zip(slots) {
            match slot {
                Some(grid) => grids.push(grid),
                None => missing.push(var.channel()),
            }
        }
        if !missing.is_empty() {
            warn!(missing = ?missing, "extraction left channels unfilled");
            return Err(CharneyError::IncompleteExtraction {
                expected: vars.len(),
                actual: grids.len(),
            });
        }

        let (latitudes, longitudes) = match (latitudes, longitudes) {
            (Some(lats), Some(lons)) => (lats, lons),
            _ => {
                return Err(CharneyError::DataNotFound {
                    message: "no grid coordinates were captured".to_string(),
                })
            }
        };

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableDef;
    use ndarray::Array2;
    use pretty_assertions::assert_eq;

    fn table() -> VariableTable {
        VariableTable::new(vec![
            VariableDef::surface(167, "t2m", "2m_temperature", "t2m", "K"),
            VariableDef::surface(151, "msl", "mean_sea_level_pressure", "msl", "Pa"),
            VariableDef::pressure(129, "z", "geopotential", "z", "m**2 s**-2"),
        ])
        .unwrap()
    }

    struct FakeMessage {
        code: u32,
        level: u32,
        level_type: &'static str,
        rows: usize,
        cols: usize,
        fill: f64,
    }

    impl FakeMessage {
        fn new(code: u32, level: u32, level_type: &'static str, fill: f64) -> Self {
            Self {
                code,
                level,
                level_type,
                rows: 3,
                cols: 4,
                fill,
            }
        }

        fn with_shape(mut self, rows: usize, cols: usize) -> Self {
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
            Ok(self.level_type.to_string())
        }

        fn grids(&self) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>)> {
            let shape = (self.rows, self.cols);
            let lats = Array2::from_shape_fn(shape, |(j, _)| 90.0 - j as f64);
            let lons = Array2::from_shape_fn(shape, |(_, i)| i as f64);
            let values = Array2::from_elem(shape, self.fill);
            Ok((lons, lats, values))
        }
    }

    struct VecSource {
        messages: Vec<FakeMessage>,
        cursor: usize,
    }

    impl VecSource {
        fn new(messages: Vec<FakeMessage>) -> Self {
            Self {
                messages,
                cursor: 0,
            }
        }
    }

    impl MessageSource for VecSource {
        type Msg = FakeMessage;

        fn next_message(&mut self) -> Result<Option<&FakeMessage>> {
            let next = self.messages.get(self.cursor);
            if next.is_some() {
                self.cursor += 1;
            }
            Ok(next)
        }
    }

    fn t2m() -> Variable {
        Variable::Surface {
            code: 167,
            name: "t2m".to_string(),
        }
    }

    fn z500() -> Variable {
        Variable::Pressure {
            code: 129,
            name: "z".to_string(),
            level: 500,
        }
    }

    #[test]
    fn test_extract_matches_and_orders_channels() {
        let vars = vec![t2m(), z500()];
        // shuffled order, plus fields nobody requested
        let source = VecSource::new(vec![
            FakeMessage::new(129, 850, "isobaricInhPa", 8.0),
            FakeMessage::new(129, 500, "isobaricInhPa", 5.0),
            FakeMessage::new(999, 0, "surface", 9.0),
            FakeMessage::new(167, 0, "surface", 2.0),
        ]);

        let stack = GribExtractor::new(table())
            .extract(&vars, vec![source])
            .unwrap();

        assert_eq!(stack.values.dim(), (2, 3, 4));
        assert_eq!(stack.values[[0, 0, 0]], 2.0);
        assert_eq!(stack.values[[1, 2, 3]], 5.0);
        assert_eq!(stack.latitudes, vec![90.0, 89.0, 88.0]);
        assert_eq!(stack.longitudes, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(stack.channels, vars);
    }

    #[test]
    fn test_extract_across_multiple_sources() {
        let vars = vec![t2m(), z500()];
        let surface = VecSource::new(vec![FakeMessage::new(167, 0, "surface", 2.0)]);
        let pressure = VecSource::new(vec![FakeMessage::new(129, 500, "isobaricInhPa", 5.0)]);

        let stack = GribExtractor::new(table())
            .extract(&vars, vec![surface, pressure])
            .unwrap();
        assert_eq!(stack.values.dim(), (2, 3, 4));
        assert_eq!(stack.values[[1, 0, 0]], 5.0);
    }

    #[test]
    fn test_repeated_field_keeps_later_grid() {
        let vars = vec![z500()];
        let source = VecSource::new(vec![
            FakeMessage::new(129, 500, "isobaricInhPa", 1.0),
            FakeMessage::new(129, 500, "isobaricInhPa", 2.0),
        ]);

        let stack = GribExtractor::new(table())
            .extract(&vars, vec![source])
            .unwrap();
        assert_eq!(stack.values[[0, 0, 0]], 2.0);
    }

    #[test]
    fn test_missing_channel_fails_with_counts() {
        let vars = vec![t2m(), z500()];
        let source = VecSource::new(vec![FakeMessage::new(167, 0, "surface", 2.0)]);

        let err = GribExtractor::new(table())
            .extract(&vars, vec![source])
            .unwrap_err();
        match err {
            CharneyError::IncompleteExtraction { expected, actual } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected incomplete extraction, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_drift_fails() {
        let vars = vec![t2m(), z500()];
        let source = VecSource::new(vec![
            FakeMessage::new(167, 0, "surface", 2.0),
            FakeMessage::new(129, 500, "isobaricInhPa", 5.0).with_shape(6, 8),
        ]);

        let err = GribExtractor::new(table())
            .extract(&vars, vec![source])
            .unwrap_err();
        assert!(matches!(err, CharneyError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_empty_channel_list_is_rejected() {
        let source = VecSource::new(vec![]);
        let err = GribExtractor::new(table())
            .extract(&[], vec![source])
            .unwrap_err();
        assert!(matches!(err, CharneyError::EmptyChannelList));
    }

    #[test]
    fn test_unclassified_level_type_is_skipped() {
        let vars = vec![z500()];
        // right code and level, but a model-level coordinate
        let source = VecSource::new(vec![FakeMessage::new(129, 500, "hybrid", 5.0)]);

        let err = GribExtractor::new(table())
            .extract(&vars, vec![source])
            .unwrap_err();
        assert!(matches!(err, CharneyError::IncompleteExtraction { .. }));
    }

    #[test]
    fn test_height_above_ground_is_not_surface_by_default() {
        let vars = vec![t2m()];
        // archives label 2 m temperature heightAboveGround; matching it
        // takes an explicit opt-in, not the default classification
        let messages = || vec![FakeMessage::new(167, 2, "heightAboveGround", 2.0)];

        let err = GribExtractor::new(table())
            .extract(&vars, vec![VecSource::new(messages())])
            .unwrap_err();
        assert!(matches!(err, CharneyError::IncompleteExtraction { .. }));

        let stack = GribExtractor::new(table())
            .with_surface_level_types(["surface", "heightAboveGround"])
            .extract(&vars, vec![VecSource::new(messages())])
            .unwrap();
        assert_eq!(stack.values[[0, 0, 0]], 2.0);
    }

    #[test]
    fn test_zero_extent_grid_is_rejected() {
        let vars = vec![z500()];
        let source =
            VecSource::new(vec![FakeMessage::new(129, 500, "isobaricInhPa", 5.0).with_shape(3, 0)]);

        let err = GribExtractor::new(table())
            .extract(&vars, vec![source])
            .unwrap_err();
        assert!(matches!(err, CharneyError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_level_type_classification_is_configurable() {
        let vars = vec![z500()];
        let source = VecSource::new(vec![FakeMessage::new(129, 500, "isobaricLayer", 5.0)]);

        let stack = GribExtractor::new(table())
            .with_pressure_level_types(["isobaricLayer"])
            .extract(&vars, vec![source])
            .unwrap();
        assert_eq!(stack.values[[0, 0, 0]], 5.0);
    }

    #[test]
    fn test_duplicate_requested_descriptor_leaves_second_slot_empty() {
        let vars = vec![z500(), z500()];
        let source = VecSource::new(vec![FakeMessage::new(129, 500, "isobaricInhPa", 5.0)]);

        let err = GribExtractor::new(table())
            .extract(&vars, vec![source])
            .unwrap_err();
        assert!(matches!(
            err,
            CharneyError::IncompleteExtraction {
                expected: 2,
                actual: 1
            }
        ));
    }
}
