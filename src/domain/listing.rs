// src/domain/listing.rs

use crate::domain::property_type::PropertyType;
use serde::{Deserialize, Serialize};

/// A listing after type coercion: every column typed, no nulls, fields in
/// canonical column order. Coordinates are still present because the outlier
/// filter and the geo-clusterer consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoercedListing {
    pub property_code: String,

    pub price: f64,
    pub num_photos: i64,
    pub floor: i64,
    pub rooms: i64,
    pub bathrooms: i64,
    pub size: f64,
    pub parking_space_price: f64,
    pub latitude: f64,
    pub longitude: f64,

    pub exterior: bool,
    pub renew: bool,
    #[serde(rename = "new_development")]
    pub new_development: bool,
    pub has_parking_space: bool,
    pub is_parking_space_included_in_price: bool,
    pub is_finished: bool,
    pub has_lift: bool,
    pub has_plan: bool,
    #[serde(rename = "has360")]
    pub has_360: bool,
    #[serde(rename = "has3DTour")]
    pub has_3d_tour: bool,
    pub has_video: bool,

    pub property_type: PropertyType,
}

impl CoercedListing {
    /// Numeric columns the outlier detector scores on, coordinates last.
    pub fn outlier_features(&self) -> [f64; 9] {
        [
            self.price,
            self.num_photos as f64,
            self.floor as f64,
            self.rooms as f64,
            self.bathrooms as f64,
            self.size,
            self.parking_space_price,
            self.latitude,
            self.longitude,
        ]
    }

    /// Swaps the raw coordinates for a zone label.
    pub fn into_processed(self, direction: String) -> ProcessedListing {
        ProcessedListing {
            property_code: self.property_code,
            price: self.price,
            num_photos: self.num_photos,
            floor: self.floor,
            rooms: self.rooms,
            bathrooms: self.bathrooms,
            size: self.size,
            parking_space_price: self.parking_space_price,
            exterior: self.exterior,
            renew: self.renew,
            new_development: self.new_development,
            has_parking_space: self.has_parking_space,
            is_parking_space_included_in_price: self.is_parking_space_included_in_price,
            is_finished: self.is_finished,
            has_lift: self.has_lift,
            has_plan: self.has_plan,
            has_360: self.has_360,
            has_3d_tour: self.has_3d_tour,
            has_video: self.has_video,
            property_type: self.property_type,
            direction,
        }
    }
}

/// One row of the warehouse, in `PROCESSED_COLUMNS` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedListing {
    pub property_code: String,

    pub price: f64,
    pub num_photos: i64,
    pub floor: i64,
    pub rooms: i64,
    pub bathrooms: i64,
    pub size: f64,
    pub parking_space_price: f64,

    pub exterior: bool,
    pub renew: bool,
    #[serde(rename = "new_development")]
    pub new_development: bool,
    pub has_parking_space: bool,
    pub is_parking_space_included_in_price: bool,
    pub is_finished: bool,
    pub has_lift: bool,
    pub has_plan: bool,
    #[serde(rename = "has360")]
    pub has_360: bool,
    #[serde(rename = "has3DTour")]
    pub has_3d_tour: bool,
    pub has_video: bool,

    pub property_type: PropertyType,
    pub direction: String,
}

impl ProcessedListing {
    /// Looks up a numeric column by its dataset name.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        let value = match column {
            "price" => self.price,
            "numPhotos" => self.num_photos as f64,
            "floor" => self.floor as f64,
            "rooms" => self.rooms as f64,
            "bathrooms" => self.bathrooms as f64,
            "size" => self.size,
            "parkingSpacePrice" => self.parking_space_price,
            _ => return None,
        };
        Some(value)
    }

    pub fn flag(&self, column: &str) -> Option<bool> {
        let value = match column {
            "exterior" => self.exterior,
            "renew" => self.renew,
            "new_development" => self.new_development,
            "hasParkingSpace" => self.has_parking_space,
            "isParkingSpaceIncludedInPrice" => self.is_parking_space_included_in_price,
            "isFinished" => self.is_finished,
            "hasLift" => self.has_lift,
            "hasPlan" => self.has_plan,
            "has360" => self.has_360,
            "has3DTour" => self.has_3d_tour,
            "hasVideo" => self.has_video,
            _ => return None,
        };
        Some(value)
    }

    pub fn category(&self, column: &str) -> Option<&str> {
        match column {
            "propertyType" => Some(self.property_type.as_str()),
            "direction" => Some(&self.direction),
            _ => None,
        }
    }
}
