//! Independent per-field-group transforms. Each one consumes its raw
//! columns and writes flat, typed-ish replacements into the row.

pub mod floor;
pub mod lift;
pub mod parking;
pub mod status;

pub use floor::FloorModes;

use floor::normalize_floor;
use lift::normalize_lift;
use parking::normalize_parking;
use status::normalize_status;

use crate::errors::Result;
use crate::etl::row::Row;

/// Runs every normalizer over one row. Floor is the only one that can fail.
pub fn normalize_row(row: &mut Row, floor_modes: &FloorModes) -> Result<()> {
    normalize_status(row);
    normalize_parking(row);
    normalize_floor(row, floor_modes)?;
    normalize_lift(row);
    Ok(())
}
