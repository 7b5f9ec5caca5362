//! GRIB file sources backed by ecCodes.
//!
//! [`EccodesSource`] wraps an ecCodes file handle as a [`MessageSource`],
//! and [`KeyedMessage`] gets a [`GridMessage`] implementation reading the
//! same keys the matching logic needs: `paramId`, `level`, `typeOfLevel`
//! and the decoded coordinate/value grids. Everything here needs the
//! system ecCodes library, hence the `eccodes` cargo feature.

use std::path::{Path, PathBuf};

use eccodes::{CodesHandle, FallibleStreamingIterator, GribFile, KeyType, KeyedMessage, ProductKind};
use ndarray::Array2;
use tracing::debug;

use super::source::{GridMessage, MessageSource};
use super::GribExtractor;
use crate::dataset::ChannelStack;
use crate::error::{CharneyError, Result};
use crate::variables::Variable;

fn read_int(message: &KeyedMessage, key: &str) -> Result<i64> {
    match message.read_key(key)?.value {
        KeyType::Int(value) => Ok(value),
        other => Err(CharneyError::Source {
            message: format!("GRIB key '{}' is not an integer: {:?}", key, other),
        }),
    }
}

fn read_unsigned(message: &KeyedMessage, key: &str) -> Result<u32> {
    let value = read_int(message, key)?;
    u32::try_from(value).map_err(|_| CharneyError::Source {
        message: format!("GRIB key '{}' value {} is out of range", key, value),
    })
}

impl GridMessage for KeyedMessage {
    fn param_code(&self) -> Result<u32> {
        read_unsigned(self, "paramId")
    }

    fn level(&self) -> Result<u32> {
        read_unsigned(self, "level")
    }

    fn level_type(&self) -> Result<String> {
        match self.read_key("typeOfLevel")?.value {
            KeyType::Str(value) => Ok(value),
            other => Err(CharneyError::Source {
                message: format!("GRIB key 'typeOfLevel' is not a string: {:?}", other),
            }),
        }
    }

    fn grids(&self) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>)> {
        Ok(self.to_lons_lats_values()?)
    }
}

/// Streams the messages of one GRIB file.
///
/// The underlying handle is released when the source drops, which the
/// extractor does as soon as the file is drained.
pub struct EccodesSource {
    path: PathBuf,
    handle: CodesHandle<GribFile>,
}

impl EccodesSource {
    /// Open a GRIB file for streaming.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "opening GRIB file");
        let handle = CodesHandle::new_from_file(&path, ProductKind::GRIB)?;
        Ok(Self { path, handle })
    }

    /// The file this source reads
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MessageSource for EccodesSource {
    type Msg = KeyedMessage;

    fn next_message(&mut self) -> Result<Option<&KeyedMessage>> {
        Ok(self.handle.next()?)
    }
}

impl GribExtractor {
    /// Extract the requested channels from GRIB files on disk.
    pub fn extract_files<P: AsRef<Path>>(
        &self,
        vars: &[Variable],
        paths: &[P],
    ) -> Result<ChannelStack> {
        let sources = paths
            .iter()
            .map(|path| EccodesSource::open(path))
            .collect::<Result<Vec<_>>>()?;
        self.extract(vars, sources)
    }
}
