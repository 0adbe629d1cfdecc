// src/etl/normalizers/floor.rs

use crate::domain::{ProcessedListing, PropertyType};
use crate::errors::{EtlError, Result};
use crate::etl::row::Row;
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Per-`propertyType` fill values for missing floors.
///
/// Building it is the first of two passes over a batch: floors differ too
/// much between flats and houses for a single global fill value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloorModes {
    modes: HashMap<String, String>,
}

impl FloorModes {
    /// Most frequent non-null raw floor within each property type. Ties go to
    /// the lowest decoded level.
    pub fn fit(rows: &[Row]) -> Self {
        Self::from_pairs(
            rows.iter()
                .filter_map(|row| raw_floor(row.get("floor")).map(|f| (group_key(row), f))),
        )
    }

    /// Modes over already-processed listings, used when a single record has
    /// no batch to learn from.
    pub fn from_processed(listings: &[ProcessedListing]) -> Self {
        Self::from_pairs(
            listings
                .iter()
                .map(|l| (l.property_type.as_str().to_string(), l.floor.to_string())),
        )
    }

    fn from_pairs(pairs: impl Iterator<Item = (String, String)>) -> Self {
        let mut counts: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (group, floor) in pairs {
            *counts.entry(group).or_default().entry(floor).or_insert(0) += 1;
        }

        let modes = counts
            .into_iter()
            .filter_map(|(group, floors)| {
                // undecodable floors lose every tie
                floors
                    .into_iter()
                    .min_by_key(|(floor, n)| {
                        (
                            Reverse(*n),
                            decode_floor(floor).unwrap_or(i64::MAX),
                            floor.clone(),
                        )
                    })
                    .map(|(floor, _)| (group, floor))
            })
            .collect();

        Self { modes }
    }

    pub fn mode_for(&self, property_type: &str) -> Option<&str> {
        self.modes.get(property_type).map(String::as_str)
    }
}

/// Maps a raw floor to its integer level: `bj` and `en` are ground floor
/// variants, `st` is the basement.
pub fn decode_floor(raw: &str) -> Option<i64> {
    match raw.trim() {
        "bj" | "en" => Some(0),
        "st" => Some(-1),
        other => other.parse::<i64>().ok(),
    }
}

/// Second pass: fills a missing floor from the row's group mode, then
/// decodes it. Fails with `EtlError::FloorParse` for an unknown encoding or a
/// missing floor whose group has no mode.
pub fn normalize_floor(row: &mut Row, modes: &FloorModes) -> Result<()> {
    let raw = match raw_floor(row.get("floor")) {
        Some(raw) => raw,
        None => {
            let group = group_key(row);
            modes
                .mode_for(&group)
                .map(str::to_string)
                .ok_or_else(|| EtlError::FloorParse {
                    property_code: row.property_code.clone(),
                    raw: format!("missing, and no floor observed for propertyType '{group}'"),
                })?
        }
    };

    let floor = decode_floor(&raw).ok_or_else(|| EtlError::FloorParse {
        property_code: row.property_code.clone(),
        raw: raw.clone(),
    })?;

    row.set("floor", floor);
    Ok(())
}

/// Non-null floor as text. Numbers that went through a float column come
/// back as `3.0`; those are written as integers.
fn raw_floor(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) if f.fract() == 0.0 && f.is_finite() => Some((f as i64).to_string()),
            _ => Some(n.to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// Canonical property type label, the same key `from_processed` stores under.
fn group_key(row: &Row) -> String {
    let kind = match row.get("propertyType") {
        Value::String(s) => PropertyType::normalize(s),
        Value::Null => PropertyType::Other,
        other => PropertyType::normalize(&other.to_string()),
    };
    kind.as_str().to_string()
}
