use crate::errors::{EtlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Runtime configuration, read from `etl.toml`. Every section has defaults so
/// a missing file just means "use the defaults".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub paths: PathsConfig,
    pub outliers: OutlierConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub country: String,
    pub operation: String,
    pub property_type: String,
    pub location_id: String,
    pub max_items: u32,
    pub page_delay_secs: u64,
    pub max_attempts: u64,
    pub max_backoff_secs: u64,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.idealista.com".to_string(),
            country: "es".to_string(),
            operation: "rent".to_string(),
            property_type: "homes".to_string(),
            location_id: "0-EU-ES-46".to_string(),
            max_items: 50,
            page_delay_secs: 5,
            max_attempts: 3,
            max_backoff_secs: 10,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub warehouse: PathBuf,
    pub raw_dir: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            warehouse: PathBuf::from("data/processed/rent_valencia.sqlite3"),
            raw_dir: PathBuf::from("data/raw"),
            artifacts_dir: PathBuf::from("models"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub n_neighbors: usize,
    pub contamination: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            contamination: 0.1,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| EtlError::Config(format!("Invalid config '{}': {}", path.display(), e)))?;

        if !(0.0..0.5).contains(&config.outliers.contamination) {
            return Err(EtlError::Config(format!(
                "outliers.contamination must be in [0, 0.5), got {}",
                config.outliers.contamination
            )));
        }
        if config.outliers.n_neighbors == 0 {
            return Err(EtlError::Config("outliers.n_neighbors must be positive".into()));
        }

        Ok(config)
    }
}

/// API key and secret for the listing source, taken from the environment
/// (a `.env` file is loaded in `main`).
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("API_KEY")
            .map_err(|_| EtlError::Config("API_KEY environment variable not set".into()))?;
        let secret = std::env::var("SECRET")
            .map_err(|_| EtlError::Config("SECRET environment variable not set".into()))?;
        Ok(Self { api_key, secret })
    }
}
