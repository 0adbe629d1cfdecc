// src/domain/columns.rs

//! Column names shared by every pipeline stage. The training side fits
//! column-positional transformers, so the orders below are part of the
//! dataset contract and must not be rearranged.

/// Row key.
pub const PROPERTY_CODE: &str = "propertyCode";

/// Columns the schema projector keeps from a raw listing.
pub const REQUIRED_COLUMNS: [&str; 19] = [
    "propertyCode",
    "price",
    "numPhotos",
    "size",
    "floor",
    "rooms",
    "bathrooms",
    "latitude",
    "longitude",
    "propertyType",
    "status",
    "parkingSpace",
    "exterior",
    "hasLift",
    "hasPlan",
    "has360",
    "has3DTour",
    "hasVideo",
    "newDevelopmentFinished",
];

/// Canonical order of a warehouse row: coordinates replaced by the zone label.
pub const PROCESSED_COLUMNS: [&str; 20] = [
    "price",
    "numPhotos",
    "floor",
    "rooms",
    "bathrooms",
    "size",
    "parkingSpacePrice",
    "exterior",
    "renew",
    "new_development",
    "hasParkingSpace",
    "isParkingSpaceIncludedInPrice",
    "isFinished",
    "hasLift",
    "hasPlan",
    "has360",
    "has3DTour",
    "hasVideo",
    "propertyType",
    "direction",
];

/// Raw boolean flags that the source omits rather than sets to false.
pub const OPTIONAL_FLAGS: [&str; 5] = ["exterior", "hasPlan", "has360", "has3DTour", "hasVideo"];
