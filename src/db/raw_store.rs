use crate::errors::Result;
use crate::scraper::RawListing;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LAST_GOOD_FILE: &str = "data_raw.json";
const CHECKPOINT_FILE: &str = "data_raw_corrupted.json";

/// Raw listing snapshots on disk: the last complete extraction and the
/// checkpoint left by an interrupted one.
#[derive(Debug, Clone)]
pub struct RawStore {
    dir: PathBuf,
}

impl RawStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn last_good_path(&self) -> PathBuf {
        self.dir.join(LAST_GOOD_FILE)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    /// `None` when no extraction ever completed.
    pub fn load_last_good(&self) -> Result<Option<Vec<RawListing>>> {
        read_snapshot(&self.last_good_path())
    }

    pub fn load_checkpoint(&self) -> Result<Option<Vec<RawListing>>> {
        read_snapshot(&self.checkpoint_path())
    }

    pub fn save_last_good(&self, records: &[RawListing]) -> Result<()> {
        write_atomic(&self.last_good_path(), records)?;
        info!(
            "Saved {} raw records to {}",
            records.len(),
            self.last_good_path().display()
        );
        Ok(())
    }

    pub fn save_checkpoint(&self, records: &[RawListing]) -> Result<()> {
        write_atomic(&self.checkpoint_path(), records)?;
        info!(
            "Saved {} raw records to recovery checkpoint {}",
            records.len(),
            self.checkpoint_path().display()
        );
        Ok(())
    }
}

/// Previous records first, then the fresh ones not seen before. Records are
/// compared as whole JSON objects.
pub fn unify(prior: Vec<RawListing>, fresh: Vec<RawListing>) -> Result<Vec<RawListing>> {
    let mut seen = HashSet::with_capacity(prior.len() + fresh.len());
    let mut out = Vec::with_capacity(prior.len() + fresh.len());

    for record in prior.into_iter().chain(fresh) {
        if seen.insert(serde_json::to_string(&record)?) {
            out.push(record);
        }
    }

    debug!("Unified raw snapshot has {} records", out.len());
    Ok(out)
}

fn read_snapshot(path: &Path) -> Result<Option<Vec<RawListing>>> {
    if !path.exists() {
        return Ok(None);
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(Some(serde_json::from_reader(reader)?))
}

fn write_atomic(path: &Path, records: &[RawListing]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, records)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
