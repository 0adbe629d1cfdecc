// src/predict.rs

use crate::errors::{EtlError, Result};
use crate::etl::normalizers::FloorModes;
use crate::etl::target::inv_box_cox;
use crate::etl::transform_single;
use crate::model::{FittedArtifacts, PriceModel};
use crate::scraper::ListingSource;
use std::fmt;
use tracing::info;
use url::Url;

const LISTING_HOST: &str = "www.idealista.com";
const LISTING_PATH: &str = "/inmueble/";

#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Monthly rent in euros.
    Price(f64),
    /// The URL or the listing it points to cannot be priced.
    InvalidInput(String),
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Price(price) => write!(f, "Predicted rent: {price:.0} EUR/month"),
            Prediction::InvalidInput(reason) => write!(f, "Invalid input: {reason}"),
        }
    }
}

/// Property code of a listing page URL, or `None` when the URL is not one.
pub fn property_code_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if url.scheme() != "https" || url.host_str() != Some(LISTING_HOST) {
        return None;
    }
    let code = url.path().strip_prefix(LISTING_PATH)?.split('/').next()?;

    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(code.to_string())
}

/// Looks the listing up, runs it through the single-record pipeline and the
/// fitted model, and maps the output back to euros.
///
/// A bad URL or an unknown listing is an `InvalidInput` result. Source and
/// pipeline failures are errors.
pub fn predict_price<S>(
    raw_url: &str,
    source: &S,
    artifacts: &FittedArtifacts,
    floor_modes: &FloorModes,
) -> Result<Prediction>
where
    S: ListingSource + ?Sized,
{
    let Some(code) = property_code_from_url(raw_url) else {
        return Ok(Prediction::InvalidInput(format!(
            "'{raw_url}' is not an idealista listing URL"
        )));
    };

    let records = source.lookup(&code)?;
    let Some(record) = records.first() else {
        return Ok(Prediction::InvalidInput(format!(
            "listing {code} was not found"
        )));
    };

    let listing = transform_single(record, floor_modes, &artifacts.clusterer)?;
    let features = artifacts.preprocessor.transform(&listing)?;
    let transformed = artifacts.model.predict(&features)?;
    let price = inv_box_cox(transformed, artifacts.lambda)?;

    if !price.is_finite() {
        return Err(EtlError::Domain(format!(
            "model output {transformed} maps to a non-finite price"
        )));
    }

    info!(
        "Listing {code} in zone '{}' priced at {price:.2}",
        listing.direction
    );
    Ok(Prediction::Price(price))
}
