use crate::config::{Config, Credentials};
use crate::db::{ingest_runs, warehouse, Database, RawStore};
use crate::etl::normalizers::FloorModes;
use crate::etl::{target, GeoClusterer, KnnDetector};
use crate::ingest::Ingestor;
use crate::model::artifacts::CLUSTERER_FILE;
use crate::model::FittedArtifacts;
use crate::scraper::{extract_all, FetchError, IdealistaClient, RetryPolicy};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod config;
mod db;
mod domain;
mod errors;
mod etl;
mod ingest;
mod logging;
mod model;
mod predict;
mod scraper;
mod spreadsheets;

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(name = "rent_price_etl")]
#[command(about = "Rental listing ETL and price prediction")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "etl.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch listings, run the batch pipeline and merge into the warehouse
    Ingest,
    /// Predict the monthly rent of one listing page
    Predict {
        /// Listing URL, e.g. https://www.idealista.com/inmueble/12345678/
        url: String,
    },
    /// Export the warehouse to an .xlsx workbook
    Export { path: PathBuf },
    /// Print warehouse row counts and the fitted price lambda
    Summary,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let db = Database::new(&config.paths.warehouse);

    match cli.command {
        Commands::Ingest => run_ingest(&config, &db)?,
        Commands::Predict { url } => run_predict(&config, &db, &url)?,
        Commands::Export { path } => {
            let rows = warehouse::load_all(&db)?;
            spreadsheets::export_warehouse_xlsx(&rows, &path)
                .with_context(|| format!("exporting to {}", path.display()))?;
            println!("Exported {} rows to {}", rows.len(), path.display());
        }
        Commands::Summary => run_summary(&db)?,
    }

    Ok(())
}

fn run_ingest(config: &Config, db: &Database) -> anyhow::Result<()> {
    let clusterer = GeoClusterer::load(&config.paths.artifacts_dir.join(CLUSTERER_FILE))
        .context("loading the geo-clusterer")?;
    let detector = KnnDetector::from(&config.outliers);
    let raw_store = RawStore::new(&config.paths.raw_dir);
    let policy = RetryPolicy::from(&config.source);

    let ingestor = Ingestor {
        db,
        raw_store: &raw_store,
        clusterer: &clusterer,
        detector: &detector,
        location_id: &config.source.location_id,
    };

    let summary = ingestor.run(|| {
        let credentials =
            Credentials::from_env().map_err(|e| FetchError::Credentials(e.to_string()))?;
        let client = IdealistaClient::connect(&config.source, &credentials)?;
        extract_all(&client, &policy)
    })?;

    println!("Ingest finished");
    println!("   Pages fetched: {}", summary.outcome.pages_fetched);
    println!("   Records fetched: {}", summary.outcome.records_fetched);
    if summary.outcome.used_fallback {
        println!("   Used last-good raw snapshot");
    }
    println!("   Rows rejected: {}", summary.batch.rejected.len());
    for rejection in &summary.batch.rejected {
        println!("      - {}: {}", rejection.property_code, rejection.error);
    }
    println!("   Outliers dropped: {}", summary.batch.outliers_dropped);
    println!(
        "   Rows merged: {} ({} already stored)",
        summary.merge.inserted, summary.merge.duplicates
    );
    Ok(())
}

fn run_predict(config: &Config, db: &Database, url: &str) -> anyhow::Result<()> {
    if predict::property_code_from_url(url).is_none() {
        let invalid = predict::Prediction::InvalidInput(format!(
            "'{url}' is not an idealista listing URL"
        ));
        println!("{invalid}");
        return Ok(());
    }

    let artifacts = FittedArtifacts::load(&config.paths.artifacts_dir)?;

    let history = warehouse::load_all(db)?;
    let floor_modes = FloorModes::from_processed(&history);
    info!("Floor modes learned from {} warehouse rows", history.len());

    let credentials = Credentials::from_env()?;
    let client = IdealistaClient::connect(&config.source, &credentials)?;

    let prediction = predict::predict_price(url, &client, &artifacts, &floor_modes)?;
    println!("{prediction}");
    Ok(())
}

fn run_summary(db: &Database) -> anyhow::Result<()> {
    let rows = warehouse::load_all(db)?;
    println!("Warehouse: {} rows", rows.len());

    for (zone, n) in warehouse::zone_counts(db)? {
        println!("   {zone}: {n}");
    }

    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
    match target::fit(&prices) {
        Ok((_, lambda)) => println!("Box-Cox lambda of price: {lambda:.4}"),
        Err(e) => println!("Box-Cox lambda of price: unavailable ({e})"),
    }

    if db.exists() {
        if let Some(run) = ingest_runs::get_recent_runs(db)?.first() {
            println!(
                "Last ingest run #{} for {}: {} ({} rows merged)",
                run.id,
                run.location_id,
                if run.success { "ok" } else { "failed" },
                run.rows_merged.unwrap_or(0)
            );
            if let Some(msg) = &run.error_message {
                println!("   {msg}");
            }
        }
    }
    Ok(())
}
