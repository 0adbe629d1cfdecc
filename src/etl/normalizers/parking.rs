// src/etl/normalizers/parking.rs

use crate::errors::EtlError;
use crate::etl::row::Row;
use serde_json::{Map, Value};
use tracing::debug;

/// Flat view of the `parkingSpace` sub-object.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParkingSpace {
    pub has_parking_space: bool,
    pub included_in_price: bool,
    pub price: f64,
}

/// The shapes `parkingSpace` arrives in.
#[derive(Debug)]
enum ParkingField<'a> {
    Missing,
    Object(&'a Map<String, Value>),
    /// A Python-style dict literal, e.g. `{'hasParkingSpace': True}`.
    Encoded(&'a str),
    Unexpected(&'a Value),
}

impl<'a> ParkingField<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::Null => ParkingField::Missing,
            Value::Object(map) => ParkingField::Object(map),
            Value::String(s) if s.trim().is_empty() => ParkingField::Missing,
            Value::String(s) => ParkingField::Encoded(s),
            other => ParkingField::Unexpected(other),
        }
    }
}

/// Decodes any shape of `parkingSpace`. Never fails: anything unreadable is
/// treated as "no parking data".
pub fn decode_parking(value: &Value) -> ParkingSpace {
    match ParkingField::classify(value) {
        ParkingField::Missing => ParkingSpace::default(),
        ParkingField::Object(map) => from_object(map),
        ParkingField::Encoded(text) => match parse_encoded(text) {
            Ok(map) => from_object(&map),
            Err(e) => {
                debug!("{e}; treating as no parking data");
                ParkingSpace::default()
            }
        },
        ParkingField::Unexpected(other) => {
            debug!("Unexpected parkingSpace value {other}; treating as no parking data");
            ParkingSpace::default()
        }
    }
}

/// Replaces `parkingSpace` with its three flat columns.
pub fn normalize_parking(row: &mut Row) {
    let parking = decode_parking(&row.take("parkingSpace"));

    row.set("hasParkingSpace", parking.has_parking_space);
    row.set("isParkingSpaceIncludedInPrice", parking.included_in_price);
    row.set("parkingSpacePrice", parking.price);
}

fn from_object(map: &Map<String, Value>) -> ParkingSpace {
    let flag = |key: &str| map.get(key).and_then(Value::as_bool).unwrap_or(false);
    let price = map
        .get("parkingSpacePrice")
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|p| p.is_finite())
        .unwrap_or(0.0);

    ParkingSpace {
        has_parking_space: flag("hasParkingSpace"),
        included_in_price: flag("isParkingSpaceIncludedInPrice"),
        price,
    }
}

fn parse_encoded(text: &str) -> Result<Map<String, Value>, EtlError> {
    let json = pythonic_to_json(&text.replace('\'', "\""));

    match serde_json::from_str::<Value>(&json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(EtlError::Parse {
            field: "parkingSpace".into(),
            reason: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(EtlError::Parse {
            field: "parkingSpace".into(),
            reason: e.to_string(),
        }),
    }
}

/// Rewrites the bare literals `True`, `False` and `None` outside of string
/// literals into their JSON spelling.
fn pythonic_to_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    let mut in_string = false;
    let mut escaped = false;

    let flush = |word: &mut String, out: &mut String| {
        out.push_str(match word.as_str() {
            "True" => "true",
            "False" => "false",
            "None" => "null",
            other => other,
        });
        word.clear();
    };

    for c in text.chars() {
        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if c.is_ascii_alphabetic() {
            word.push(c);
            continue;
        }

        flush(&mut word, &mut out);
        if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    flush(&mut word, &mut out);

    out
}
