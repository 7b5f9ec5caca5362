//! Traits for streaming grid messages.
//!
//! The extractor is written against these two traits rather than a concrete
//! GRIB reader: [`MessageSource`] is a fallible streaming iterator whose
//! messages borrow from the source, and [`GridMessage`] exposes the handful
//! of keys and grids the extractor needs from each message. The ecCodes
//! adapter implements both behind the `eccodes` feature; tests drive the
//! extractor with in-memory fakes.

use ndarray::Array2;

use crate::error::Result;

/// One decoded grid message.
///
/// Key accessors are cheap header reads; [`grids`](Self::grids) decodes the
/// payload, so the extractor only calls it for messages that match a
/// requested channel.
pub trait GridMessage {
    /// The archive parameter code identifying the variable
    fn param_code(&self) -> Result<u32>;

    /// The vertical level value (hPa for isobaric messages)
    fn level(&self) -> Result<u32>;

    /// The vertical coordinate kind, e.g. "isobaricInhPa" or "surface"
    fn level_type(&self) -> Result<String>;

    /// Longitude, latitude and value grids, each shaped `[rows, cols]`
    /// with latitude varying along rows and longitude along columns.
    fn grids(&self) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>)>;
}

/// A stream of grid messages.
///
/// Messages borrow from the source, so only one message is live at a time
/// and the backing file handle can reuse its decode buffers. Dropping the
/// source releases whatever it holds open.
pub trait MessageSource {
    /// The message type this source yields
    type Msg: GridMessage;

    /// Advance to the next message, or `None` when the source is exhausted.
    fn next_message(&mut self) -> Result<Option<&Self::Msg>>;
}
