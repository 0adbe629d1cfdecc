// src/etl/pipeline.rs

use crate::domain::ProcessedListing;
use crate::errors::{EtlError, Result};
use crate::etl::coercion::coerce;
use crate::etl::geo::GeoClusterer;
use crate::etl::normalizers::{normalize_row, FloorModes};
use crate::etl::outliers::KnnDetector;
use crate::etl::projector::{project, project_one};
use crate::scraper::RawListing;
use tracing::{info, warn};

/// A row excluded from a batch, with the reason.
#[derive(Debug)]
pub struct Rejection {
    pub property_code: String,
    pub error: EtlError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub received: usize,
    pub projected: usize,
    pub rejected: Vec<Rejection>,
    pub outliers_dropped: usize,
    pub processed: usize,
}

/// Raw batch -> warehouse-ready rows.
///
/// Steps run in a fixed order: projection, field normalizers, type coercion,
/// outlier filter, geo-clustering. A floor that cannot be decoded rejects its
/// row; every other failure aborts the whole batch.
pub fn transform_batch(
    records: &[RawListing],
    clusterer: &GeoClusterer,
    detector: &KnnDetector,
) -> Result<(Vec<ProcessedListing>, BatchReport)> {
    clusterer.validate()?;

    let mut report = BatchReport {
        received: records.len(),
        ..Default::default()
    };

    let rows = project(records)?;
    report.projected = rows.len();

    let floor_modes = FloorModes::fit(&rows);
    let mut normalized = Vec::with_capacity(rows.len());
    for mut row in rows {
        match normalize_row(&mut row, &floor_modes) {
            Ok(()) => normalized.push(row),
            Err(error) => {
                warn!("Rejecting listing {}: {error}", row.property_code);
                report.rejected.push(Rejection {
                    property_code: row.property_code,
                    error,
                });
            }
        }
    }
    info!(
        "Normalized {} rows ({} rejected)",
        normalized.len(),
        report.rejected.len()
    );

    let coerced = normalized.iter().map(coerce).collect::<Result<Vec<_>>>()?;
    info!("Coerced {} rows to canonical types", coerced.len());

    let (kept, outliers) = detector.filter(coerced);
    report.outliers_dropped = outliers.dropped;

    let processed = clusterer.assign(kept)?;
    report.processed = processed.len();
    info!("Clustered {} rows into zones", processed.len());

    Ok((processed, report))
}

/// Single-record variant used for inference: no outlier filter and no
/// warehouse. Floor modes come from previously processed data since one
/// record has no batch to learn them from.
pub fn transform_single(
    record: &RawListing,
    floor_modes: &FloorModes,
    clusterer: &GeoClusterer,
) -> Result<ProcessedListing> {
    let mut row = project_one(record)?;
    normalize_row(&mut row, floor_modes)?;
    let coerced = coerce(&row)?;

    let zone = clusterer.zone(coerced.latitude, coerced.longitude)?.to_string();
    Ok(coerced.into_processed(zone))
}
