// src/model/preprocessor.rs

use crate::domain::ProcessedListing;
use crate::errors::{EtlError, Result};
use serde::{Deserialize, Serialize};

/// Standard-scaled numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

/// One-hot encoded categorical column, categories in fitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    pub categories: Vec<String>,
}

/// Fitted column transformer: scaled numerics, then one-hot blocks, then
/// boolean passthrough columns as 0/1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
    #[serde(default)]
    pub passthrough: Vec<String>,
}

impl Preprocessor {
    pub fn n_features(&self) -> usize {
        self.numeric.len()
            + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
            + self.passthrough.len()
    }

    /// Feature vector for one record, columns resolved by name.
    pub fn transform(&self, listing: &ProcessedListing) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.n_features());

        for num in &self.numeric {
            check_not_target(&num.column)?;
            let value = listing
                .numeric(&num.column)
                .ok_or_else(|| unknown_column("numeric", &num.column))?;
            // a zero-variance column was fitted with scale 1
            let scale = if num.scale == 0.0 { 1.0 } else { num.scale };
            out.push((value - num.mean) / scale);
        }

        for cat in &self.categorical {
            let value = listing
                .category(&cat.column)
                .ok_or_else(|| unknown_column("categorical", &cat.column))?;
            // unseen categories encode as all zeros
            out.extend(
                cat.categories
                    .iter()
                    .map(|c| if c == value { 1.0 } else { 0.0 }),
            );
        }

        for column in &self.passthrough {
            let value = listing
                .flag(column)
                .ok_or_else(|| unknown_column("boolean", column))?;
            out.push(if value { 1.0 } else { 0.0 });
        }

        Ok(out)
    }
}

fn check_not_target(column: &str) -> Result<()> {
    if column == "price" {
        return Err(EtlError::Artifact(
            "preprocessor lists the price target as a feature".into(),
        ));
    }
    Ok(())
}

fn unknown_column(kind: &str, column: &str) -> EtlError {
    EtlError::Artifact(format!("preprocessor expects unknown {kind} column '{column}'"))
}
