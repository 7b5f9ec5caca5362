//! Channel name parsing.
//!
//! Channel names are the compact spellings used in model channel lists:
//! a surface variable is its table name verbatim ("t2m", "u100m"), a
//! pressure-level variable is the family name followed by the level in hPa
//! ("z500", "q925"). Parsing is resolution against a [`VariableTable`]:
//! the surface name lookup runs before any attempt to split off a level,
//! so "u100m" stays the 100 m wind and never becomes "u" at 100 hPa.
//!
//! Three entry points cover the two calling styles: the `parse_single_levels`
//! and `parse_pressure_levels` filters keep only the channels of their kind
//! and drop the rest silently, while [`parse_all_variables`] demands that
//! every channel resolve and fails on the first one that does not. All three
//! preserve input order and duplicates.

use crate::error::{CharneyError, Result};
use crate::variables::{Variable, VariableTable};

/// Split a channel into a family prefix and a numeric level.
///
/// The split point is the first ASCII digit; the remainder must be all
/// digits for the split to count ("z500" yes, "z500x" no, "500" has an
/// empty family and resolves to nothing).
fn split_channel(channel: &str) -> Option<(&str, u32)> {
    let idx = channel.find(|c: char| c.is_ascii_digit())?;
    let (family, level) = channel.split_at(idx);
    let level = level.parse::<u32>().ok()?;
    Some((family, level))
}

/// Resolve one channel name against the table, surface names first.
fn resolve_channel(table: &VariableTable, channel: &str) -> Option<Variable> {
    if let Some(var) = table.surface_by_name(channel) {
        return Some(var);
    }
    let (family, level) = split_channel(channel)?;
    table.pressure_by_name(family, level)
}

/// Resolve the channels that name surface variables, dropping all others.
pub fn parse_single_levels<S: AsRef<str>>(channels: &[S], table: &VariableTable) -> Vec<Variable> {
    channels
        .iter()
        .filter_map(|channel| table.surface_by_name(channel.as_ref()))
        .collect()
}

/// Resolve the channels that name pressure-level variables, dropping all
/// others.
///
/// A channel that is also a surface name (like "u100m") is a surface
/// variable and is dropped here, not reinterpreted as a level.
pub fn parse_pressure_levels<S: AsRef<str>>(channels: &[S], table: &VariableTable) -> Vec<Variable> {
    channels
        .iter()
        .filter_map(|channel| {
            let channel = channel.as_ref();
            if table.is_surface_name(channel) {
                return None;
            }
            let (family, level) = split_channel(channel)?;
            table.pressure_by_name(family, level)
        })
        .collect()
}

/// Resolve every channel, failing on the first one the table does not know.
pub fn parse_all_variables<S: AsRef<str>>(
    channels: &[S],
    table: &VariableTable,
) -> Result<Vec<Variable>> {
    channels
        .iter()
        .map(|channel| {
            let channel = channel.as_ref();
            resolve_channel(table, channel).ok_or_else(|| CharneyError::Parse {
                channel: channel.to_string(),
                message: "not a known surface variable or pressure-level channel".to_string(),
            })
        })
        .collect()
}
