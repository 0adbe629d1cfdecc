use crate::db::warehouse::{count_rows, load_all, merge_batch};
use crate::tests::utils::{init_temp_db, processed};

#[test]
fn second_batch_adds_only_new_rows() {
    let (_dir, db) = init_temp_db();

    let first: Vec<_> = (0..10)
        .map(|i| processed(&format!("{i}"), 800.0 + i as f64, "central"))
        .collect();
    merge_batch(&db, &first).unwrap();
    assert_eq!(count_rows(&db).unwrap(), 10);

    let mut second: Vec<_> = first[2..5].to_vec();
    second.push(processed("10", 1_000.0, "north"));
    second.push(processed("11", 1_100.0, "west"));

    let summary = merge_batch(&db, &second).unwrap();
    assert_eq!(summary.previous_rows, 10);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.duplicates, 3);
    assert_eq!(count_rows(&db).unwrap(), 12);

    // old rows first, new ones appended in batch order
    let stored = load_all(&db).unwrap();
    assert_eq!(&stored[..10], &first[..]);
    assert_eq!(stored[10].property_code, "10");
    assert_eq!(stored[11].property_code, "11");
}

#[test]
fn duplicates_inside_one_batch_collapse() {
    let (_dir, db) = init_temp_db();

    let row = processed("5", 750.0, "south");
    let summary = merge_batch(&db, &[row.clone(), row.clone(), row]).unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(count_rows(&db).unwrap(), 1);
}

#[test]
fn failed_merge_leaves_warehouse_untouched() {
    let (_dir, db) = init_temp_db();
    merge_batch(&db, &[processed("1", 800.0, "central")]).unwrap();

    // the second row fails after the first was inserted
    let mut bad = processed("2", 900.0, "central");
    bad.price = f64::NAN;
    let batch = vec![processed("3", 950.0, "north"), bad];

    assert!(merge_batch(&db, &batch).is_err());
    assert_eq!(count_rows(&db).unwrap(), 1);
}
