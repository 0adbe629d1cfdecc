use crate::errors::Result;
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::hash_map::{Entry, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slots, one per database file.
thread_local! {
    static DB_CONNS: RefCell<HashMap<PathBuf, Connection>> = RefCell::new(HashMap::new());
}

/// Handle to the warehouse database file.
///
/// The warehouse assumes a single writer: two ingest runs against the same
/// file at the same time are not supported.
#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file is there yet. It is created by the first successful
    /// merge (or by `init_db`).
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Provides a mutable connection to the closure, opening it on first use
    /// in this thread.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        DB_CONNS.with(|cell| -> Result<T> {
            let mut conns = cell.borrow_mut();
            let conn = match conns.entry(self.path.clone()) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        fs::create_dir_all(parent)?;
                    }
                    slot.insert(Connection::open(&self.path)?)
                }
            };
            f(conn)
        })
    }
}

/// Creates the warehouse tables if they are missing.
pub fn init_db(db: &Database) -> Result<()> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    })?;

    info!("Database schema ready at {}", db.path().display());
    Ok(())
}
