//! Pipeline configuration. Paths are relative to the working directory unless absolute.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding `customers.csv` and `transactions.csv`
    pub raw_dir: PathBuf,
    /// Directory receiving exported feature tables
    pub output_dir: PathBuf,
    /// Human-readable feature summary
    pub summary_path: PathBuf,
    /// SQLite feature table
    pub store_path: PathBuf,
    /// Per-customer aggregation parameters
    pub aggregation: AggregationConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Fan the per-customer loop out over the rayon pool
    pub parallel: bool,
    /// Worker threads for the pool; 0 keeps rayon's default (one per core)
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/transformed"),
            summary_path: PathBuf::from("data/feature_summary.txt"),
            store_path: PathBuf::from("data/features.db"),
            aggregation: AggregationConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            workers: 0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        // Logger is not installed yet; stderr is the only channel.
        match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<PipelineConfig>(&data) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn customers_path(&self) -> PathBuf {
        self.raw_dir.join("customers.csv")
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.raw_dir.join("transactions.csv")
    }

    /// Point raw inputs, exports, summary and store at one base directory
    /// (`<base>/raw`, `<base>/transformed`, `<base>/feature_summary.txt`, `<base>/features.db`).
    pub fn with_data_dir(mut self, base: &Path) -> Self {
        self.raw_dir = base.join("raw");
        self.output_dir = base.join("transformed");
        self.summary_path = base.join("feature_summary.txt");
        self.store_path = base.join("features.db");
        self
    }
}
