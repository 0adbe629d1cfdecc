use crate::db::connection::{init_db, Database};
use crate::domain::{CoercedListing, ProcessedListing, PropertyType};
use crate::etl::GeoClusterer;
use crate::model::artifacts::{CLUSTERER_FILE, LAMBDA_FILE, MODEL_FILE, PREPROCESSOR_FILE};
use crate::scraper::models::SearchPage;
use crate::scraper::{FetchError, ListingSource, RawListing};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tempfile::TempDir;

/// Fresh warehouse file in its own temp dir. Keep the dir alive for the test.
pub fn temp_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("temp dir: {e}"));
    let db = Database::new(dir.path().join("warehouse.sqlite3"));
    (dir, db)
}

pub fn init_temp_db() -> (TempDir, Database) {
    let (dir, db) = temp_db();
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    (dir, db)
}

/// Four zones around Valencia.
pub fn valencia_clusterer() -> GeoClusterer {
    GeoClusterer {
        feature_names: vec!["latitude".into(), "longitude".into()],
        centers: vec![
            vec![39.47, -0.377],
            vec![39.43, -0.36],
            vec![39.50, -0.37],
            vec![39.47, -0.41],
        ],
        labels: BTreeMap::from([
            (0, "central".to_string()),
            (1, "south".to_string()),
            (2, "north".to_string()),
            (3, "west".to_string()),
        ]),
    }
}

pub fn coerced(code: &str, price: f64) -> CoercedListing {
    CoercedListing {
        property_code: code.to_string(),
        price,
        num_photos: 20,
        floor: 2,
        rooms: 3,
        bathrooms: 1,
        size: 80.0,
        parking_space_price: 0.0,
        latitude: 39.47,
        longitude: -0.377,
        exterior: true,
        renew: false,
        new_development: false,
        has_parking_space: false,
        is_parking_space_included_in_price: false,
        is_finished: true,
        has_lift: true,
        has_plan: false,
        has_360: false,
        has_3d_tour: false,
        has_video: true,
        property_type: PropertyType::Flat,
    }
}

pub fn processed(code: &str, price: f64, direction: &str) -> ProcessedListing {
    coerced(code, price).into_processed(direction.to_string())
}

pub fn raw_from(value: Value) -> RawListing {
    match value {
        Value::Object(map) => RawListing(map),
        other => panic!("not an object: {other}"),
    }
}

/// Complete raw listing as the source sends it, located in the central zone.
pub fn raw_value(code: &str, price: f64) -> Value {
    json!({
        "propertyCode": code,
        "price": price,
        "numPhotos": 20,
        "size": 80.0,
        "floor": "2",
        "rooms": 3,
        "bathrooms": 1,
        "latitude": 39.47,
        "longitude": -0.377,
        "propertyType": "flat",
        "status": "good",
        "parkingSpace": null,
        "exterior": true,
        "hasLift": true,
        "hasPlan": false,
        "has360": false,
        "has3DTour": false,
        "hasVideo": true,
        "newDevelopmentFinished": null,
        "thumbnail": "https://img.example/listing.jpg",
        "municipality": "Valencia"
    })
}

pub fn raw_listing(code: &str, price: f64) -> RawListing {
    raw_from(raw_value(code, price))
}

/// Same raw listing with some fields replaced.
pub fn raw_with(code: &str, price: f64, overrides: Value) -> RawListing {
    let mut value = raw_value(code, price);
    if let (Value::Object(base), Value::Object(extra)) = (&mut value, overrides) {
        base.extend(extra);
    }
    raw_from(value)
}

/// Writes a consistent artifact set: log-price target (lambda 0) and a
/// linear model that prices an 80 m2 listing at exactly 900.
pub fn write_artifacts(dir: &Path) {
    let write = |name: &str, value: Value| {
        std::fs::write(dir.join(name), value.to_string())
            .unwrap_or_else(|e| panic!("writing {name}: {e}"))
    };

    write(
        CLUSTERER_FILE,
        serde_json::to_value(valencia_clusterer()).unwrap_or_else(|e| panic!("{e}")),
    );
    write(
        PREPROCESSOR_FILE,
        json!({
            "numeric": [
                {"column": "size", "mean": 80.0, "scale": 20.0},
                {"column": "rooms", "mean": 3.0, "scale": 1.0},
                {"column": "bathrooms", "mean": 1.5, "scale": 0.5}
            ],
            "categorical": [
                {"column": "direction", "categories": ["central", "north", "south", "west"]},
                {"column": "propertyType", "categories": ["flat", "penthouse"]}
            ],
            "passthrough": ["hasLift", "exterior"]
        }),
    );
    write(LAMBDA_FILE, json!(0.0));
    write(
        MODEL_FILE,
        json!({
            "kind": "linear",
            "intercept": 900f64.ln(),
            "coefficients": [0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        }),
    );
}

/// In-memory listing source: fixed search pages, lookups by code. Pages in
/// `failing` always error; every requested page number lands in `calls`.
#[derive(Default)]
pub struct FakeSource {
    pub pages: Vec<Vec<RawListing>>,
    pub listings: HashMap<String, RawListing>,
    pub failing: HashMap<u32, fn() -> FetchError>,
    pub calls: RefCell<Vec<u32>>,
}

impl FakeSource {
    pub fn with_listing(record: RawListing) -> Self {
        let code = record
            .get("propertyCode")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            listings: HashMap::from([(code, record)]),
            ..Default::default()
        }
    }
}

impl ListingSource for FakeSource {
    fn search_page(&self, page: u32) -> Result<SearchPage, FetchError> {
        self.calls.borrow_mut().push(page);
        if let Some(make_err) = self.failing.get(&page) {
            return Err(make_err());
        }
        let records = self
            .pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .ok_or_else(|| FetchError::Http {
                status: 404,
                body: format!("no page {page}"),
            })?;
        Ok(SearchPage {
            element_list: records,
            total_pages: self.pages.len() as u32,
            actual_page: Some(page),
            total: None,
        })
    }

    fn lookup(&self, property_code: &str) -> Result<Vec<RawListing>, FetchError> {
        Ok(self.listings.get(property_code).cloned().into_iter().collect())
    }
}
