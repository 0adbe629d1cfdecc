// src/model/regressor.rs

use crate::errors::{EtlError, Result};
use serde::{Deserialize, Serialize};

/// A fitted regressor predicting the Box-Cox transformed price.
pub trait PriceModel {
    fn n_features(&self) -> usize;
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl PriceModel for LinearModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(EtlError::Artifact(format!(
                "model expects {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }
}

/// On-disk model, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
}

impl PriceModel for ModelArtifact {
    fn n_features(&self) -> usize {
        match self {
            ModelArtifact::Linear(m) => m.n_features(),
        }
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        match self {
            ModelArtifact::Linear(m) => m.predict(features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_prediction() {
        let model: ModelArtifact = serde_json::from_str(
            r#"{"kind": "linear", "intercept": 1.5, "coefficients": [2.0, -1.0]}"#,
        )
        .unwrap();

        assert_eq!(model.n_features(), 2);
        assert_eq!(model.predict(&[1.0, 3.0]).unwrap(), 0.5);
        assert!(matches!(model.predict(&[1.0]), Err(EtlError::Artifact(_))));
    }
}
