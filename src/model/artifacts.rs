// src/model/artifacts.rs

use crate::errors::{EtlError, Result};
use crate::etl::GeoClusterer;
use crate::model::preprocessor::Preprocessor;
use crate::model::regressor::{ModelArtifact, PriceModel};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::info;

pub const CLUSTERER_FILE: &str = "kmeans_clustering.json";
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const LAMBDA_FILE: &str = "lambda_value.json";
pub const MODEL_FILE: &str = "model.json";

/// Everything a training run leaves behind, read once and never written.
#[derive(Debug, Clone)]
pub struct FittedArtifacts {
    pub clusterer: GeoClusterer,
    pub preprocessor: Preprocessor,
    pub lambda: f64,
    pub model: ModelArtifact,
}

impl FittedArtifacts {
    pub fn load(dir: &Path) -> Result<Self> {
        let clusterer = GeoClusterer::load(&dir.join(CLUSTERER_FILE))?;
        let preprocessor: Preprocessor = read_json(&dir.join(PREPROCESSOR_FILE))?;
        let lambda: f64 = read_json(&dir.join(LAMBDA_FILE))?;
        let model: ModelArtifact = read_json(&dir.join(MODEL_FILE))?;

        if !lambda.is_finite() {
            return Err(EtlError::Artifact(format!("lambda {lambda} is not finite")));
        }
        if preprocessor.n_features() != model.n_features() {
            return Err(EtlError::Artifact(format!(
                "preprocessor produces {} features but the model expects {}",
                preprocessor.n_features(),
                model.n_features()
            )));
        }

        info!("Loaded fitted artifacts from {}", dir.display());
        Ok(Self {
            clusterer,
            preprocessor,
            lambda,
            model,
        })
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .map_err(|e| EtlError::Artifact(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| EtlError::Artifact(format!("cannot parse {}: {e}", path.display())))
}
