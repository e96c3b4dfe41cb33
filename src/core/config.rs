//! Configuration management for the ingestion core.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{IngestError, Result};
use crate::core::indexable::DEFAULT_ANALYZER;
use crate::core::xdg::XdgDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Smallest per-thread indexing heap tantivy accepts
pub const MIN_HEAP_BYTES_PER_THREAD: usize = 15_000_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub writer: WriterConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Index writer configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WriterConfig {
    /// Indexing heap shared by all writer threads, in bytes
    #[serde(default = "default_heap_size")]
    pub heap_size_bytes: usize,

    /// Indexing threads (0 = engine default)
    #[serde(default)]
    pub num_threads: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the index
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
}

/// Ingestion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Analyzer used when a mutation request has no override
    #[serde(default = "default_analyzer")]
    pub default_analyzer: String,

    /// Events per batch (one commit per batch) when reading event files
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Text fields of the event schema (TEXT | STORED)
    #[serde(default = "default_text_fields")]
    pub text_fields: Vec<String>,

    /// Glob pattern selecting event files inside a directory
    #[serde(default = "default_event_pattern")]
    pub event_pattern: String,
}

// Default value functions
fn default_heap_size() -> usize {
    50_000_000
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_analyzer() -> String {
    DEFAULT_ANALYZER.to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_text_fields() -> Vec<String> {
    vec!["title".to_string(), "body".to_string()]
}

fn default_event_pattern() -> String {
    "*.jsonl".to_string()
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            heap_size_bytes: default_heap_size(),
            num_threads: 0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_analyzer: default_analyzer(),
            batch_size: default_batch_size(),
            text_fields: default_text_fields(),
            event_pattern: default_event_pattern(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| IngestError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config with priority: env vars > TOML > defaults
    pub fn load() -> Result<Self> {
        let xdg = XdgDirs::new();
        Self::load_with_xdg(&xdg)
    }

    /// Load config with explicit XDG directories
    ///
    /// Priority order:
    /// 1. NRT_INGEST_CONFIG env var
    /// 2. XDG config file (~/.config/nrt-ingest/config.toml)
    /// 3. ./nrt-ingest.toml
    /// 4. Defaults
    pub fn load_with_xdg(xdg: &XdgDirs) -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("NRT_INGEST_CONFIG") {
            Self::from_file(config_path)?
        } else {
            let xdg_config = xdg.config_file();
            if xdg_config.exists() {
                Self::from_file(xdg_config)?
            } else if Path::new("nrt-ingest.toml").exists() {
                Self::from_file("nrt-ingest.toml")?
            } else {
                Self::default()
            }
        };

        // Use the XDG data directory unless a location was configured
        if env::var("NRT_INGEST_DATA_DIR").is_err()
            && config.storage.index_dir == default_index_dir()
        {
            config.storage.index_dir = xdg.index_dir();
        }

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        // Writer configuration
        if let Ok(heap) = env::var("NRT_INGEST_HEAP_BYTES") {
            if let Ok(bytes) = heap.parse() {
                self.writer.heap_size_bytes = bytes;
            }
        }
        if let Ok(threads) = env::var("NRT_INGEST_THREADS") {
            if let Ok(n) = threads.parse() {
                self.writer.num_threads = n;
            }
        }

        // Storage configuration
        if let Ok(data_dir) = env::var("NRT_INGEST_DATA_DIR") {
            self.storage.index_dir = PathBuf::from(data_dir).join("index");
        }

        // Ingest configuration
        if let Ok(analyzer) = env::var("NRT_INGEST_DEFAULT_ANALYZER") {
            if !analyzer.trim().is_empty() {
                self.ingest.default_analyzer = analyzer;
            }
        }
        if let Ok(batch_size) = env::var("NRT_INGEST_BATCH_SIZE") {
            if let Ok(size) = batch_size.parse() {
                self.ingest.batch_size = size;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate writer config
        let threads = self.writer.num_threads.max(1);
        if self.writer.heap_size_bytes < MIN_HEAP_BYTES_PER_THREAD * threads {
            return Err(IngestError::ConfigError(format!(
                "Writer heap must be at least {} bytes for {} thread(s)",
                MIN_HEAP_BYTES_PER_THREAD * threads,
                threads
            )));
        }

        // Validate ingest config
        if self.ingest.default_analyzer.trim().is_empty() {
            return Err(IngestError::ConfigError(
                "Default analyzer must be non-empty".to_string(),
            ));
        }

        if self.ingest.batch_size == 0 {
            return Err(IngestError::ConfigError(
                "Batch size must be non-zero".to_string(),
            ));
        }

        if self.ingest.text_fields.is_empty() {
            return Err(IngestError::ConfigError(
                "At least one text field is required".to_string(),
            ));
        }

        glob::Pattern::new(&self.ingest.event_pattern).map_err(|e| {
            IngestError::ConfigError(format!(
                "Invalid event pattern '{}': {e}",
                self.ingest.event_pattern
            ))
        })?;

        Ok(())
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Writer heap: {} bytes", self.writer.heap_size_bytes);
        tracing::info!(
            "  Writer threads: {}",
            match self.writer.num_threads {
                0 => "auto".to_string(),
                n => n.to_string(),
            }
        );
        tracing::info!("  Index dir: {:?}", self.storage.index_dir);
        tracing::info!("  Default analyzer: {}", self.ingest.default_analyzer);
        tracing::info!("  Batch size: {} events", self.ingest.batch_size);
        tracing::info!("  Text fields: {:?}", self.ingest.text_fields);
        tracing::info!("  Event pattern: {}", self.ingest.event_pattern);
    }
}
