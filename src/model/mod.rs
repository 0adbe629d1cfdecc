pub mod artifacts;
pub mod preprocessor;
pub mod regressor;

pub use artifacts::FittedArtifacts;
pub use regressor::PriceModel;
