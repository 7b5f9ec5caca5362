//! Error types for the charney crate.
//!
//! This module defines one error enum covering every failure mode in the
//! channel-resolution and extraction pipeline. All errors are fatal to the
//! operation that detects them and propagate to the caller; nothing is
//! retried internally.

use thiserror::Error;

/// The main error type for charney operations.
#[derive(Error, Debug)]
pub enum CharneyError {
    /// A channel name could not be resolved against the variable table
    #[error("Unrecognized channel '{channel}': {message}")]
    Parse { channel: String, message: String },

    /// Archive requests could not be merged into a single request
    #[error("Request merge failed: {message}")]
    Merge { message: String },

    /// Not every requested channel was found in the supplied grid files
    #[error("Incomplete extraction: expected {expected} fields, found {actual}")]
    IncompleteExtraction { expected: usize, actual: usize },

    /// An unrecognized naming convention or other invalid setting
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A grid message's spatial shape disagrees with the rest of the file set
    #[error("Grid shape mismatch: {message}")]
    ShapeMismatch { message: String },

    /// A variable, coordinate or level is missing from a labeled dataset
    #[error("Data not found: {message}")]
    DataNotFound { message: String },

    /// The channel list given to an extraction or selection was empty
    #[error("Channel list is empty")]
    EmptyChannelList,

    /// A grid message source failed to open, iterate or decode
    #[error("Message source error: {message}")]
    Source { message: String },

    /// ecCodes binding errors
    #[cfg(feature = "eccodes")]
    #[error("ecCodes error: {0}")]
    Eccodes(#[from] eccodes::errors::CodesError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results with CharneyError
pub type Result<T> = std::result::Result<T, CharneyError>;
