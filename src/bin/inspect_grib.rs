//! Quick inspection tool for GRIB files.
//!
//! Prints the identifying keys of every message in a file and the channel
//! it would resolve to, which is the fastest way to see why a channel did
//! not match:
//!
//! ```text
//! cargo run --features eccodes --bin inspect_grib -- path/to/file.grib
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use eccodes::{CodesHandle, FallibleStreamingIterator, KeyType, KeyedMessage, ProductKind};

use charney::extract::{DEFAULT_PRESSURE_LEVEL_TYPES, DEFAULT_SURFACE_LEVEL_TYPES};
use charney::{GridMessage, VariableTable};

fn key_to_string(message: &KeyedMessage, key: &str) -> String {
    match message.read_key(key) {
        Ok(k) => match k.value {
            KeyType::Int(v) => v.to_string(),
            KeyType::Float(v) => v.to_string(),
            KeyType::Str(v) => v,
            other => format!("{:?}", other),
        },
        Err(e) => format!("<error: {}>", e),
    }
}

/// The channel this message would fill, under the default classification.
fn resolved_channel(table: &VariableTable, message: &KeyedMessage) -> Option<String> {
    let code = message.param_code().ok()?;
    let level_type = message.level_type().ok()?;
    if DEFAULT_PRESSURE_LEVEL_TYPES.contains(&level_type.as_str()) {
        let level = message.level().ok()?;
        table.pressure_by_code(code, level)
    } else if DEFAULT_SURFACE_LEVEL_TYPES.contains(&level_type.as_str()) {
        table.surface_by_code(code)
    } else {
        None
    }
    .map(|var| var.channel())
}

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("usage: inspect_grib <file.grib>")?;
    let path = Path::new(&path);

    println!("Inspecting GRIB file: {}", path.display());

    let table = VariableTable::era5();
    let mut handle = CodesHandle::new_from_file(path, ProductKind::GRIB)?;

    let mut count = 0usize;
    while let Some(message) = handle.next()? {
        count += 1;
        let channel = resolved_channel(&table, message).unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<4} paramId={:<8} shortName={:<8} typeOfLevel={:<18} level={:<5} grid={}x{} -> {}",
            count,
            key_to_string(message, "paramId"),
            key_to_string(message, "shortName"),
            key_to_string(message, "typeOfLevel"),
            key_to_string(message, "level"),
            key_to_string(message, "Ni"),
            key_to_string(message, "Nj"),
            channel,
        );
    }

    if count == 0 {
        bail!("no GRIB messages found in {}", path.display());
    }
    println!("\n{} messages total", count);

    Ok(())
}
