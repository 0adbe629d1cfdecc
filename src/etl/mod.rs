pub mod coercion;
pub mod geo;
pub mod normalizers;
pub mod outliers;
pub mod pipeline;
pub mod projector;
pub mod row;
pub mod target;

pub use geo::GeoClusterer;
pub use outliers::KnnDetector;
pub use pipeline::{transform_batch, transform_single, BatchReport};
