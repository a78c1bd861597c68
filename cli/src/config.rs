//! Configuration for the employees CLI
//!
//! Stored in `<config dir>/employees/config.toml`. Every value has a default,
//! so a missing file is not an error.

use anyhow::{Context, Result};
use employee_core::CompressionOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "employees";
const CONFIG_FILE: &str = "config.toml";
const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_max_image_bytes() -> usize {
    CompressionOptions::default().max_bytes
}

fn default_max_image_dimension() -> u32 {
    CompressionOptions::default().max_dimension
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_image_bytes: default_max_image_bytes(),
            max_image_dimension: default_max_image_dimension(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Default location of the key-value file holding the session token
    pub fn storage_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(STORAGE_FILE))
    }

    /// Load config from the default location, or fall back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn compression(&self) -> CompressionOptions {
        CompressionOptions {
            max_bytes: self.max_image_bytes,
            max_dimension: self.max_image_dimension,
        }
    }
}
