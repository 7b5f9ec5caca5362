//! Command-line configuration for the charney CLI.
//!
//! Arguments follow the usual precedence: command-line flags first, then
//! the `CHARNEY_*` environment variables, then defaults.

use chrono::NaiveDateTime;
use clap::Parser;
use std::path::PathBuf;

use crate::error::{CharneyError, Result};

/// Command-line arguments for charney
#[derive(Parser, Debug)]
#[command(name = "charney")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Channel names to resolve, e.g. u10m z500 t2m
    #[arg(required_unless_present = "model", conflicts_with = "model")]
    pub channels: Vec<String>,

    /// Resolve a model's built-in channel list instead of naming channels
    #[arg(short, long, env = "CHARNEY_MODEL")]
    pub model: Option<String>,

    /// Valid time to request, as YYYY-MM-DDTHH:MM (repeatable)
    #[arg(short = 'd', long = "date", value_parser = parse_datetime, required = true)]
    pub dates: Vec<NaiveDateTime>,

    /// Write the batched requests to this file instead of stdout
    #[arg(short, long, env = "CHARNEY_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CHARNEY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate argument values clap cannot check on its own
    pub fn validate(&self) -> Result<()> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(CharneyError::Configuration {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        other
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Parse a CLI timestamp in the fixed YYYY-MM-DDTHH:MM format
fn parse_datetime(s: &str) -> std::result::Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .map_err(|err| format!("invalid date '{}': {} (expected YYYY-MM-DDTHH:MM)", s, err))
}
