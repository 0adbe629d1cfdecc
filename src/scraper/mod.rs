mod client;
pub mod models;
mod scraper_error;

pub use client::{extract_all, Extraction, IdealistaClient, ListingSource, RetryPolicy};
pub use models::RawListing;
pub use scraper_error::FetchError;
