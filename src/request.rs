//! Archive retrieval requests and request merging.
//!
//! A retrieval request is a flat map of string keys to string-or-list
//! values, mirroring the JSON bodies the archive API accepts. The crate
//! builds one small request per descriptor and valid time, then merges each
//! dataset's pile into a single batched request: multi-valued fields become
//! deduplicated lists, the `param` codes are joined with `/` the way the
//! archive expects, and every other field keeps its first-seen value.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CharneyError, Result};
use crate::variables::{LevelKind, Variable};

/// Dataset name for surface / single-level retrievals
pub const DATASET_SINGLE_LEVELS: &str = "reanalysis-era5-single-levels";
/// Dataset name for pressure-level retrievals
pub const DATASET_PRESSURE_LEVELS: &str = "reanalysis-era5-pressure-levels";

/// Fields whose values accumulate into lists when requests merge.
///
/// Everything else is treated as a scalar that must agree across the
/// requests being merged (the first-seen value wins on disagreement).
pub const MULTI_VALUED_FIELDS: [&str; 6] =
    ["year", "month", "day", "time", "pressure_level", "param"];

/// A request field value: a single string or a list of strings.
///
/// Serialized untagged, so `"param": "129"` and `"param": ["129", "130"]`
/// both round-trip through the same type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestValue {
    /// A single value
    Text(String),
    /// Multiple values
    List(Vec<String>),
}

impl RequestValue {
    /// The individual string items, one for `Text` and each element for
    /// `List`.
    pub fn items(&self) -> Vec<&str> {
        match self {
            RequestValue::Text(value) => vec![value.as_str()],
            RequestValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for RequestValue {
    fn from(value: &str) -> Self {
        RequestValue::Text(value.to_string())
    }
}

impl From<String> for RequestValue {
    fn from(value: String) -> Self {
        RequestValue::Text(value)
    }
}

impl From<Vec<String>> for RequestValue {
    fn from(values: Vec<String>) -> Self {
        RequestValue::List(values)
    }
}

impl From<Vec<&str>> for RequestValue {
    fn from(values: Vec<&str>) -> Self {
        RequestValue::List(values.into_iter().map(String::from).collect())
    }
}

/// One archive retrieval request.
///
/// Keys are stored sorted so serialized requests are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveRequest(BTreeMap<String, RequestValue>);

impl ArchiveRequest {
    /// An empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RequestValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Chainable variant of [`insert`](Self::insert) for literal requests
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RequestValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Read a field
    pub fn get(&self, key: &str) -> Option<&RequestValue> {
        self.0.get(key)
    }

    /// Whether a field is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RequestValue)> {
        self.0.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the request has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The archive dataset a descriptor retrieves from.
pub fn dataset_for(var: &Variable) -> &'static str {
    match var.kind() {
        LevelKind::Surface => DATASET_SINGLE_LEVELS,
        LevelKind::Pressure => DATASET_PRESSURE_LEVELS,
    }
}

/// Build the single-field retrieval request for one descriptor at one
/// valid time.
pub fn request_for(var: &Variable, valid_time: &DateTime<Utc>) -> ArchiveRequest {
    let mut request = ArchiveRequest::new();
    request.insert("product_type", "reanalysis");
    request.insert("format", "grib");
    request.insert("param", var.code().to_string());
    request.insert("year", valid_time.format("%Y").to_string());
    request.insert("month", valid_time.format("%m").to_string());
    request.insert("day", valid_time.format("%d").to_string());
    request.insert("time", valid_time.format("%H:%M").to_string());
    if let Some(level) = var.level() {
        request.insert("pressure_level", level.to_string());
    }
    request
}

/// Merge per-descriptor requests into one batched request.
///
/// Multi-valued fields ([`MULTI_VALUED_FIELDS`]) collect the union of their
/// items in first-seen order; `param` additionally collapses to a single
/// `/`-joined string. Scalar fields keep the first value seen, and a
/// conflicting later value is dropped with a log line rather than an error.
/// Fails on an empty input and when the merged request ends up without a
/// `param` field; a request missing `param` is otherwise fine as long as
/// another one supplies it.
pub fn merge_requests(requests: &[ArchiveRequest]) -> Result<ArchiveRequest> {
    if requests.is_empty() {
        return Err(CharneyError::Merge {
            message: "no requests to merge".to_string(),
        });
    }

    let mut merged = ArchiveRequest::new();

    for request in requests {
        for (key, value) in request.iter() {
            if MULTI_VALUED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            match merged.get(key) {
                None => merged.insert(key.clone(), value.clone()),
                Some(existing) if existing != value => {
                    debug!(key = %key, "conflicting scalar field while merging, keeping first value");
                }
                Some(_) => {}
            }
        }
    }

    for field in MULTI_VALUED_FIELDS {
        let mut seen = HashSet::new();
        let mut items: Vec<String> = Vec::new();
        for request in requests {
            if let Some(value) = request.get(field) {
                for item in value.items() {
                    if seen.insert(item.to_string()) {
                        items.push(item.to_string());
                    }
                }
            }
        }
        if items.is_empty() {
            continue;
        }
        if field == "param" {
            merged.insert(field, items.join("/"));
        } else {
            merged.insert(field, items);
        }
    }

    // archive requests always need a parameter identifier
    if !merged.contains_key("param") {
        return Err(CharneyError::Merge {
            message: "no 'param' field present after merge".to_string(),
        });
    }

    Ok(merged)
}

/// Build one merged request per dataset for a set of descriptors and valid
/// times.
///
/// Datasets come back in the order their first descriptor appears, so a
/// channel list that opens with surface variables yields the single-level
/// request first.
pub fn batched_requests(
    vars: &[Variable],
    times: &[DateTime<Utc>],
) -> Result<Vec<(String, ArchiveRequest)>> {
    if vars.is_empty() {
        return Err(CharneyError::EmptyChannelList);
    }
    if times.is_empty() {
        return Err(CharneyError::Merge {
            message: "no valid times given".to_string(),
        });
    }

    let mut order: Vec<&'static str> = Vec::new();
    let mut groups: HashMap<&'static str, Vec<ArchiveRequest>> = HashMap::new();
    for var in vars {
        let dataset = dataset_for(var);
        if !groups.contains_key(dataset) {
            order.push(dataset);
        }
        let group = groups.entry(dataset).or_default();
        for time in times {
            group.push(request_for(var, time));
        }
    }

    order
        .into_iter()
        .map(|dataset| {
            let group = &groups[dataset];
            debug!(dataset, requests = group.len(), "merging request group");
            let merged = merge_requests(group)?;
            Ok((dataset.to_string(), merged))
        })
        .collect()
}
