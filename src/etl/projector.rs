// src/etl/projector.rs

use crate::domain::columns::{PROPERTY_CODE, REQUIRED_COLUMNS};
use crate::errors::{EtlError, Result};
use crate::etl::row::Row;
use crate::scraper::RawListing;
use serde_json::Value;
use tracing::{info, warn};

/// Columns the source leaves out of an individual listing when they carry no
/// information. A single record may lack these; every other required column
/// must be present.
pub const NULLABLE_COLUMNS: [&str; 10] = [
    "floor",
    "status",
    "parkingSpace",
    "hasLift",
    "newDevelopmentFinished",
    "exterior",
    "hasPlan",
    "has360",
    "has3DTour",
    "hasVideo",
];

/// Projects a batch onto the required columns and keys each row by its
/// property code.
///
/// Fails with `EtlError::Schema` when a required column appears in none of
/// the records, which means the source changed its contract. Records without
/// a usable property code are skipped.
pub fn project(records: &[RawListing]) -> Result<Vec<Row>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    for column in REQUIRED_COLUMNS {
        if !records.iter().any(|r| r.contains(column)) {
            return Err(EtlError::Schema {
                column: column.to_string(),
            });
        }
    }

    let rows: Vec<Row> = records.iter().filter_map(project_record).collect();

    info!(
        "Projected {} of {} records onto {} columns",
        rows.len(),
        records.len(),
        REQUIRED_COLUMNS.len()
    );
    Ok(rows)
}

/// Projection for a single listing (the inference path). Only the columns in
/// `NULLABLE_COLUMNS` may be absent.
pub fn project_one(record: &RawListing) -> Result<Row> {
    for column in REQUIRED_COLUMNS {
        if !NULLABLE_COLUMNS.contains(&column) && !record.contains(column) {
            return Err(EtlError::Schema {
                column: column.to_string(),
            });
        }
    }

    project_record(record).ok_or_else(|| EtlError::Schema {
        column: PROPERTY_CODE.to_string(),
    })
}

fn project_record(record: &RawListing) -> Option<Row> {
    let Some(property_code) = record.get(PROPERTY_CODE).and_then(property_code) else {
        warn!("Skipping record without a usable {PROPERTY_CODE}");
        return None;
    };

    let mut row = Row::new(property_code);
    for column in REQUIRED_COLUMNS.iter().filter(|c| **c != PROPERTY_CODE) {
        row.set(column, record.get(column).cloned().unwrap_or(Value::Null));
    }
    Some(row)
}

/// The source sends codes as strings, older snapshots have them as numbers.
fn property_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawListing {
        match value {
            Value::Object(map) => RawListing(map),
            other => panic!("not an object: {other}"),
        }
    }

    fn full_record(code: Value) -> Value {
        json!({
            "propertyCode": code, "price": 900.0, "numPhotos": 20, "size": 80.0,
            "floor": "2", "rooms": 3, "bathrooms": 1,
            "latitude": 39.47, "longitude": -0.37, "propertyType": "flat",
            "status": "good", "parkingSpace": null, "exterior": true,
            "hasLift": true, "hasPlan": false, "has360": false,
            "has3DTour": false, "hasVideo": true, "newDevelopmentFinished": null,
            "thumbnail": "https://img.example/1.jpg", "district": "Ruzafa"
        })
    }

    #[test]
    fn drops_extraneous_fields_and_keys_by_code() {
        let rows = project(&[raw(full_record(json!("101")))]).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.property_code, "101");
        assert!(!row.has("thumbnail"));
        assert!(!row.has("district"));
        assert!(!row.has(PROPERTY_CODE));
        assert_eq!(row.columns().count(), REQUIRED_COLUMNS.len() - 1);
    }

    #[test]
    fn column_missing_from_every_record_is_a_schema_error() {
        let mut a = full_record(json!("1"));
        let mut b = full_record(json!("2"));
        a.as_object_mut().unwrap().remove("size");
        b.as_object_mut().unwrap().remove("size");

        let err = project(&[raw(a), raw(b)]).unwrap_err();
        assert!(matches!(err, EtlError::Schema { column } if column == "size"));
    }

    #[test]
    fn column_missing_from_some_records_becomes_null() {
        let a = full_record(json!("1"));
        let mut b = full_record(json!("2"));
        b.as_object_mut().unwrap().remove("parkingSpace");
        b.as_object_mut().unwrap().remove("size");

        let rows = project(&[raw(a), raw(b)]).unwrap();
        assert_eq!(rows[1].get("size"), &Value::Null);
        assert_eq!(rows[1].get("parkingSpace"), &Value::Null);
    }

    #[test]
    fn numeric_codes_are_accepted_and_missing_codes_skipped() {
        let mut anonymous = full_record(json!(null));
        anonymous.as_object_mut().unwrap().remove("propertyCode");

        let rows = project(&[
            raw(full_record(json!(98765))),
            raw(anonymous),
            raw(full_record(json!("  "))),
        ])
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].property_code, "98765");
    }

    #[test]
    fn single_record_may_omit_nullable_columns_only() {
        let mut lean = full_record(json!("7"));
        for column in ["status", "parkingSpace", "newDevelopmentFinished", "hasLift"] {
            lean.as_object_mut().unwrap().remove(column);
        }
        assert!(project_one(&raw(lean.clone())).is_ok());

        lean.as_object_mut().unwrap().remove("rooms");
        let err = project_one(&raw(lean)).unwrap_err();
        assert!(matches!(err, EtlError::Schema { column } if column == "rooms"));
    }

    #[test]
    fn empty_batch_projects_to_nothing() {
        assert!(project(&[]).unwrap().is_empty());
    }
}
