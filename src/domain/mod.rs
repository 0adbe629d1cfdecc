pub mod columns;
pub mod listing;
pub mod property_type;

pub use listing::{CoercedListing, ProcessedListing};
pub use property_type::PropertyType;
