use crate::errors::EtlError;
use crate::etl::normalizers::FloorModes;
use crate::etl::{transform_batch, transform_single, KnnDetector};
use crate::tests::utils::{raw_listing, raw_with, valencia_clusterer};
use serde_json::json;

#[test]
fn encoded_parking_and_ground_floor_record_is_normalized() {
    let record = raw_with(
        "101",
        850.0,
        json!({
            "floor": "bj",
            "parkingSpace": "{'hasParkingSpace': True, 'isParkingSpaceIncludedInPrice': False, 'parkingSpacePrice': 50.0}",
            "hasLift": null,
            "status": "renew",
            "newDevelopmentFinished": null
        }),
    );

    let listing = transform_single(&record, &FloorModes::default(), &valencia_clusterer()).unwrap();

    assert_eq!(listing.property_code, "101");
    assert_eq!(listing.floor, 0);
    assert!(listing.has_parking_space);
    assert!(!listing.is_parking_space_included_in_price);
    assert_eq!(listing.parking_space_price, 50.0);
    assert!(!listing.has_lift);
    assert!(listing.renew);
    assert!(!listing.new_development);
    assert!(listing.is_finished);
    assert_eq!(listing.direction, "central");
}

#[test]
fn unfinished_new_development_is_not_finished() {
    let record = raw_with(
        "102",
        850.0,
        json!({"status": "newdevelopment", "newDevelopmentFinished": false}),
    );

    let listing = transform_single(&record, &FloorModes::default(), &valencia_clusterer()).unwrap();
    assert!(listing.new_development);
    assert!(!listing.is_finished);
}

#[test]
fn batch_rejects_bad_floors_and_drops_outliers() {
    let mut records: Vec<_> = (0..12).map(|i| raw_listing(&format!("{i}"), 900.0)).collect();
    records.push(raw_with("bad-floor", 900.0, json!({"floor": "entresuelo alto"})));
    records.push(raw_listing("mansion", 45_000.0));
    records.push(raw_with("no-code", 900.0, json!({"propertyCode": null})));

    let (processed, report) =
        transform_batch(&records, &valencia_clusterer(), &KnnDetector::default()).unwrap();

    assert_eq!(report.received, 15);
    assert_eq!(report.projected, 14);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].property_code, "bad-floor");
    assert!(matches!(report.rejected[0].error, EtlError::FloorParse { .. }));
    assert_eq!(report.outliers_dropped, 1);

    assert_eq!(processed.len(), 12);
    assert!(processed.iter().all(|l| l.property_code != "mansion"));
    assert!(processed.iter().all(|l| l.direction == "central"));
}

#[test]
fn null_floor_takes_the_batch_mode_of_its_type() {
    let mut records: Vec<_> = (0..3)
        .map(|i| raw_with(&format!("{i}"), 900.0, json!({"floor": "4"})))
        .collect();
    records.push(raw_with("3", 900.0, json!({"floor": "1"})));
    records.push(raw_with("4", 900.0, json!({"floor": null})));

    let (processed, report) =
        transform_batch(&records, &valencia_clusterer(), &KnnDetector::default()).unwrap();

    // five rows: too few to score outliers
    assert_eq!(report.outliers_dropped, 0);
    let imputed = processed.iter().find(|l| l.property_code == "4").unwrap();
    assert_eq!(imputed.floor, 4);
}

#[test]
fn bad_numeric_value_fails_the_batch() {
    let records = vec![
        raw_listing("1", 900.0),
        raw_with("2", 900.0, json!({"rooms": "three"})),
    ];

    let err = transform_batch(&records, &valencia_clusterer(), &KnnDetector::default()).unwrap_err();
    assert!(matches!(err, EtlError::TypeCoercion { ref column, .. } if column == "rooms"));
}

#[test]
fn missing_required_column_fails_the_batch() {
    let records: Vec<_> = (0..3)
        .map(|i| {
            let mut r = raw_listing(&format!("{i}"), 900.0);
            r.0.remove("bathrooms");
            r
        })
        .collect();

    let err = transform_batch(&records, &valencia_clusterer(), &KnnDetector::default()).unwrap_err();
    assert!(matches!(err, EtlError::Schema { ref column } if column == "bathrooms"));
}
