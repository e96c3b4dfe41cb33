//! Where nrt-ingest keeps its config file and index on disk.
//!
//! Each directory is looked up in three places: the tool's own
//! `NRT_INGEST_*_DIR` variable (used verbatim), the matching `XDG_*_HOME`
//! variable (with `nrt-ingest` appended), then the home-relative XDG
//! default. Empty variables count as unset.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "nrt-ingest";

/// Resolved config and data directories
#[derive(Debug, Clone)]
pub struct XdgDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl XdgDirs {
    pub fn new() -> Self {
        Self {
            config_dir: resolve("NRT_INGEST_CONFIG_DIR", "XDG_CONFIG_HOME", &[".config"]),
            data_dir: resolve("NRT_INGEST_DATA_DIR", "XDG_DATA_HOME", &[".local", "share"]),
        }
    }

    /// `config.toml` inside the config directory
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Default index location under the data directory
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }

    pub fn ensure_dirs_exist(&self) -> std::io::Result<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn log_paths(&self) {
        tracing::info!(
            "Using config {} and index {}",
            self.config_file().display(),
            self.index_dir().display()
        );
        tracing::debug!(
            "Directories: config={}, data={}",
            self.config_dir.display(),
            self.data_dir.display()
        );
    }
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(explicit_var: &str, xdg_var: &str, home_relative: &[&str]) -> PathBuf {
    if let Some(dir) = non_empty_var(explicit_var) {
        return PathBuf::from(dir);
    }
    if let Some(base) = non_empty_var(xdg_var) {
        return Path::new(&base).join(APP_DIR);
    }

    let mut dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.extend(home_relative);
    dir.join(APP_DIR)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
