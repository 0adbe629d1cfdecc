use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// search page
//  ├── elementList[]        one raw listing per entry
//  │    ├── propertyCode
//  │    ├── price, numPhotos, size, floor, rooms, bathrooms
//  │    ├── latitude, longitude
//  │    ├── propertyType, status, newDevelopmentFinished
//  │    ├── parkingSpace    null | object | "{'hasParkingSpace': True, ...}"
//  │    └── exterior, hasLift, hasPlan, has360, has3DTour, hasVideo
//  ├── totalPages
//  ├── actualPage
//  └── total

/// One listing exactly as the source delivered it.
///
/// Field shapes vary between records (strings vs numbers, nested objects vs
/// string-encoded objects), so the record is kept as an untyped JSON object
/// until the schema projector takes over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RawListing(pub Map<String, Value>);

impl RawListing {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

impl From<Map<String, Value>> for RawListing {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub element_list: Vec<RawListing>,
    #[serde(default)]
    pub total_pages: u32,
    pub actual_page: Option<u32>,
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}
