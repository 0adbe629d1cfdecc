pub mod connection;
pub mod ingest_runs;
pub mod raw_store;
pub mod warehouse;

pub use connection::{init_db, Database};
pub use raw_store::RawStore;
