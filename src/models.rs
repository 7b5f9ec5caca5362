//! Built-in channel lists for supported forecast models.
//!
//! Each list reproduces the exact channel order the model consumes, so a
//! stack extracted for a model can be fed to it without reindexing. The
//! pressure-level blocks are generated family-by-family from the level
//! tables rather than spelled out.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{CharneyError, Result};

const FCN_SURFACE: [&str; 8] = ["u10m", "v10m", "u100m", "v100m", "t2m", "sp", "msl", "tcwv"];
const FCN_FAMILIES: [&str; 5] = ["u", "v", "z", "t", "r"];
const FCN_LEVELS: [u32; 13] = [50, 100, 150, 200, 250, 300, 400, 500, 600, 700, 850, 925, 1000];

const PANGU_FAMILIES: [&str; 5] = ["z", "q", "t", "u", "v"];
const PANGU_LEVELS: [u32; 13] = [1000, 925, 850, 700, 600, 500, 400, 300, 250, 200, 150, 100, 50];
const PANGU_SURFACE: [&str; 4] = ["msl", "u10m", "v10m", "t2m"];

fn pressure_channels(families: &[&str], levels: &[u32]) -> Vec<String> {
    families
        .iter()
        .flat_map(|family| levels.iter().map(move |level| format!("{}{}", family, level)))
        .collect()
}

static MODEL_CHANNELS: Lazy<HashMap<&'static str, Vec<String>>> = Lazy::new(|| {
    let mut models = HashMap::new();

    // FourCastNet v2 (small): surface block first, then levels ascending
    let mut fcnv2 = FCN_SURFACE.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    fcnv2.extend(pressure_channels(&FCN_FAMILIES, &FCN_LEVELS));
    models.insert("fcnv2_sm", fcnv2);

    // Pangu-Weather: levels descending, surface block last; the 6-hourly
    // variant consumes the same channels
    let mut pangu = pressure_channels(&PANGU_FAMILIES, &PANGU_LEVELS);
    pangu.extend(PANGU_SURFACE.iter().map(|s| s.to_string()));
    models.insert("pangu", pangu.clone());
    models.insert("pangu_6", pangu);

    models
});

/// The channel list a named model consumes, in model order.
pub fn model_channels(model: &str) -> Result<&'static [String]> {
    MODEL_CHANNELS
        .get(model)
        .map(Vec::as_slice)
        .ok_or_else(|| CharneyError::Configuration {
            message: format!(
                "unknown model '{}' (known models: {})",
                model,
                known_models().join(", ")
            ),
        })
}

/// Names of the models with built-in channel lists, sorted.
pub fn known_models() -> Vec<&'static str> {
    let mut names: Vec<_> = MODEL_CHANNELS.keys().copied().collect();
    names.sort_unstable();
    names
}
