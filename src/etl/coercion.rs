// src/etl/coercion.rs

use crate::domain::columns::OPTIONAL_FLAGS;
use crate::domain::{CoercedListing, PropertyType};
use crate::errors::{EtlError, Result};
use crate::etl::row::Row;
use serde_json::Value;

/// Casts a normalized row to its declared column types.
///
/// Any value that does not cast is an `EtlError::TypeCoercion`; callers treat
/// it as a broken upstream contract and stop the batch. Running this on
/// `to_row` of its own output gives the same listing back.
pub fn coerce(row: &Row) -> Result<CoercedListing> {
    let c = Caster { row };

    Ok(CoercedListing {
        property_code: row.property_code.clone(),
        price: c.float("price")?,
        num_photos: c.int("numPhotos")?,
        floor: c.int("floor")?,
        rooms: c.int("rooms")?,
        bathrooms: c.int("bathrooms")?,
        size: c.float("size")?,
        parking_space_price: c.float("parkingSpacePrice")?,
        latitude: c.float("latitude")?,
        longitude: c.float("longitude")?,
        exterior: c.flag("exterior")?,
        renew: c.flag("renew")?,
        new_development: c.flag("new_development")?,
        has_parking_space: c.flag("hasParkingSpace")?,
        is_parking_space_included_in_price: c.flag("isParkingSpaceIncludedInPrice")?,
        is_finished: c.flag("isFinished")?,
        has_lift: c.flag("hasLift")?,
        has_plan: c.flag("hasPlan")?,
        has_360: c.flag("has360")?,
        has_3d_tour: c.flag("has3DTour")?,
        has_video: c.flag("hasVideo")?,
        property_type: PropertyType::normalize(c.text("propertyType")?),
    })
}

/// Loosely-typed view of a coerced listing.
pub fn to_row(listing: &CoercedListing) -> Row {
    let mut row = Row::new(listing.property_code.clone());
    row.set("price", listing.price);
    row.set("numPhotos", listing.num_photos);
    row.set("floor", listing.floor);
    row.set("rooms", listing.rooms);
    row.set("bathrooms", listing.bathrooms);
    row.set("size", listing.size);
    row.set("parkingSpacePrice", listing.parking_space_price);
    row.set("latitude", listing.latitude);
    row.set("longitude", listing.longitude);
    row.set("exterior", listing.exterior);
    row.set("renew", listing.renew);
    row.set("new_development", listing.new_development);
    row.set("hasParkingSpace", listing.has_parking_space);
    row.set("isParkingSpaceIncludedInPrice", listing.is_parking_space_included_in_price);
    row.set("isFinished", listing.is_finished);
    row.set("hasLift", listing.has_lift);
    row.set("hasPlan", listing.has_plan);
    row.set("has360", listing.has_360);
    row.set("has3DTour", listing.has_3d_tour);
    row.set("hasVideo", listing.has_video);
    row.set("propertyType", listing.property_type.as_str());
    row
}

struct Caster<'a> {
    row: &'a Row,
}

impl Caster<'_> {
    fn fail(&self, column: &str, expected: &'static str) -> EtlError {
        EtlError::TypeCoercion {
            property_code: self.row.property_code.clone(),
            column: column.to_string(),
            expected,
            found: describe(self.row.get(column)),
        }
    }

    fn int(&self, column: &str) -> Result<i64> {
        let parsed = match self.row.get(column) {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.fail(column, "integer"))
    }

    fn float(&self, column: &str) -> Result<f64> {
        let parsed = match self.row.get(column) {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|f| f.is_finite())
            .ok_or_else(|| self.fail(column, "float"))
    }

    fn flag(&self, column: &str) -> Result<bool> {
        let parsed = match self.row.get(column) {
            Value::Bool(b) => Some(*b),
            Value::Null if OPTIONAL_FLAGS.contains(&column) => Some(false),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed.ok_or_else(|| self.fail(column, "boolean"))
    }

    fn text(&self, column: &str) -> Result<&str> {
        match self.row.get(column) {
            Value::String(s) if !s.trim().is_empty() => Ok(s.as_str()),
            _ => Err(self.fail(column, "string")),
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => format!("string {s:?}"),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
