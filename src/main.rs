//! charney - channel resolution and batched archive requests
//!
//! This is the main entry point for the charney CLI: it resolves channel
//! names (or a model's built-in list) into descriptors and emits the merged
//! archive retrieval requests as JSON.

use chrono::{TimeZone, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};

use charney::config::Args;
use charney::request::{batched_requests, ArchiveRequest};
use charney::variables::VariableTable;
use charney::{init_tracing, log_timed_operation, model_channels, parse_all_variables, Result};

/// One merged request, tagged with the dataset it retrieves from
#[derive(Serialize)]
struct BatchedRequest {
    dataset: String,
    request: ArchiveRequest,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("Starting charney v{}", env!("CARGO_PKG_VERSION"));

    args.validate().map_err(|e| {
        error!("Invalid arguments: {}", e);
        e
    })?;

    let channels: Vec<String> = match &args.model {
        Some(model) => {
            let channels = model_channels(model).map_err(|e| {
                error!("Unknown model: {}", e);
                e
            })?;
            info!(model = %model, channels = channels.len(), "Using model channel list");
            channels.to_vec()
        }
        None => args.channels.clone(),
    };

    let table = VariableTable::era5();
    let vars = parse_all_variables(&channels, &table).map_err(|e| {
        error!("Failed to resolve channels: {}", e);
        e
    })?;
    info!("Resolved {} channels", vars.len());

    let times: Vec<_> = args
        .dates
        .iter()
        .map(|naive| Utc.from_utc_datetime(naive))
        .collect();

    let batched = log_timed_operation("batch_requests", || batched_requests(&vars, &times))?;
    let output: Vec<BatchedRequest> = batched
        .into_iter()
        .map(|(dataset, request)| BatchedRequest { dataset, request })
        .collect();

    let json = serde_json::to_string_pretty(&output)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Wrote {} requests to {:?}", output.len(), path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
