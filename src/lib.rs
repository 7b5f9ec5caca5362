//! # charney
//!
//! Variable-code resolution and grid extraction for weather-model data
//! pipelines.
//!
//! This library turns the compact channel names weather models consume
//! ("u10m", "z500", "t2m") into typed descriptors backed by an archive code
//! table, batches the archive retrieval requests those descriptors imply,
//! and extracts the delivered grids into channel-ordered arrays.
//!
//! ## Key Features
//!
//! - **Channel parsing**: resolve channel names against a variable table,
//!   with surface names always winning over level splits
//! - **Request batching**: merge per-field retrieval requests into one
//!   request per dataset, with `/`-joined parameter codes
//! - **Streaming extraction**: match GRIB messages against requested
//!   descriptors and stack the grids in channel order
//! - **Dataset selection**: pull the same channel stacks out of decoded,
//!   labeled datasets by naming convention
//!
//! ## Architecture
//!
//! - **Registry**: the [`variables::VariableTable`] maps names and archive
//!   codes to variable definitions
//! - **Resolution**: [`channels`] parses channel lists into descriptors
//! - **Requests**: [`request`] builds and merges archive retrieval requests
//! - **Extraction**: [`extract`] streams grid messages into a
//!   [`dataset::ChannelStack`]

pub mod channels;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod logging;
pub mod models;
pub mod request;
pub mod variables;

pub use channels::{parse_all_variables, parse_pressure_levels, parse_single_levels};
pub use dataset::{ChannelStack, GridVariable, LabeledDataset, NamingConvention};
pub use error::{CharneyError, Result};
pub use extract::{GribExtractor, GridMessage, MessageSource};
pub use logging::{init_tracing, log_timed_operation};
pub use models::{known_models, model_channels};
pub use request::{
    batched_requests, dataset_for, merge_requests, request_for, ArchiveRequest, RequestValue,
};
pub use variables::{LevelKind, Variable, VariableDef, VariableTable};
