// src/ingest.rs

use crate::db::ingest_runs::{end_ingest_run, start_ingest_run, RunOutcome};
use crate::db::raw_store::unify;
use crate::db::warehouse::{merge_batch, MergeSummary};
use crate::db::{init_db, Database, RawStore};
use crate::errors::{EtlError, Result};
use crate::etl::{transform_batch, BatchReport, GeoClusterer, KnnDetector};
use crate::scraper::{Extraction, FetchError, RawListing};
use chrono::Utc;
use tracing::{error, info, warn};

/// What one ingestion did.
#[derive(Debug)]
pub struct IngestSummary {
    pub outcome: RunOutcome,
    pub batch: BatchReport,
    pub merge: MergeSummary,
}

/// Wiring for one ingestion: where raw snapshots live, the warehouse, and
/// the fitted pieces the batch pipeline needs.
pub struct Ingestor<'a> {
    pub db: &'a Database,
    pub raw_store: &'a RawStore,
    pub clusterer: &'a GeoClusterer,
    pub detector: &'a KnnDetector,
    pub location_id: &'a str,
}

impl Ingestor<'_> {
    /// Fetches, snapshots, transforms and merges, and records the run in
    /// the warehouse database whatever the outcome.
    pub fn run<F>(&self, fetch: F) -> Result<IngestSummary>
    where
        F: FnOnce() -> std::result::Result<Extraction, FetchError>,
    {
        init_db(self.db)?;
        let run_id = start_ingest_run(self.db, self.location_id, Utc::now().timestamp())?;

        let mut outcome = RunOutcome::default();
        let result = self.ingest(fetch, &mut outcome);

        let error_message = result.as_ref().err().map(|e| e.to_string());
        if let Some(msg) = &error_message {
            error!("Ingest run {run_id} failed: {msg}");
        }
        end_ingest_run(
            self.db,
            run_id,
            Utc::now().timestamp(),
            &outcome,
            error_message,
        )?;

        let (batch, merge) = result?;
        info!(
            "Ingest run {run_id} finished: {} records, {} rows merged",
            outcome.records_fetched, outcome.rows_merged
        );
        Ok(IngestSummary {
            outcome,
            batch,
            merge,
        })
    }

    fn ingest<F>(&self, fetch: F, outcome: &mut RunOutcome) -> Result<(BatchReport, MergeSummary)>
    where
        F: FnOnce() -> std::result::Result<Extraction, FetchError>,
    {
        let records = self.gather(fetch, outcome)?;

        let (processed, batch) = transform_batch(&records, self.clusterer, self.detector)?;
        outcome.outliers_dropped = batch.outliers_dropped;
        outcome.rows_rejected = batch.rejected.len();

        let merge = merge_batch(self.db, &processed)?;
        outcome.rows_merged = merge.inserted;

        Ok((batch, merge))
    }

    /// Raw records for this run. A complete extraction refreshes the
    /// last-good snapshot; a partial one leaves a checkpoint and is used as
    /// is; a failed one falls back to the last-good snapshot.
    fn gather<F>(&self, fetch: F, outcome: &mut RunOutcome) -> Result<Vec<RawListing>>
    where
        F: FnOnce() -> std::result::Result<Extraction, FetchError>,
    {
        let prior = self.raw_store.load_last_good()?;

        match fetch() {
            Ok(extraction) => {
                outcome.pages_fetched = extraction.pages_fetched as usize;
                outcome.records_fetched = extraction.records.len();

                if extraction.is_complete() {
                    let records = unify(prior.unwrap_or_default(), extraction.records)?;
                    self.raw_store.save_last_good(&records)?;
                    Ok(records)
                } else {
                    warn!(
                        "Extraction stopped after {} of {} pages, continuing with what arrived",
                        extraction.pages_fetched, extraction.total_pages
                    );
                    self.raw_store.save_checkpoint(&extraction.records)?;
                    unify(prior.unwrap_or_default(), extraction.records)
                }
            }
            Err(e) => match prior {
                Some(records) => {
                    warn!(
                        "Extraction failed ({e}), falling back to {} records from {}",
                        records.len(),
                        self.raw_store.last_good_path().display()
                    );
                    outcome.used_fallback = true;
                    Ok(records)
                }
                None => Err(EtlError::Fetch(e)),
            },
        }
    }
}
