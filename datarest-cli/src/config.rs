//! `datarest.toml` configuration.

use anyhow::{Context, Result};
use datarest_hal::AssemblerConfig;
use datarest_model::PropertyExcerpts;
use datarest_patch::PatchConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

fn default_base_uri() -> String {
    "http://localhost:8080".to_string()
}

/// Settings read from `datarest.toml`.
///
/// ```toml
/// base_uri = "https://api.example.com"
///
/// [assembler]
/// expose_ids = true
///
/// [patch]
/// array_merge = "replace"
///
/// [excerpts]
/// Dept = ["id", "name"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatarestConfig {
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    #[serde(default)]
    pub assembler: AssemblerConfig,
    #[serde(default)]
    pub patch: PatchConfig,
    /// Entity type → properties of its excerpt projection.
    #[serde(default)]
    pub excerpts: BTreeMap<String, Vec<String>>,
}

impl Default for DatarestConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            assembler: AssemblerConfig::default(),
            patch: PatchConfig::default(),
            excerpts: BTreeMap::new(),
        }
    }
}

impl DatarestConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid datarest configuration")
    }

    /// Loads the configuration file if it exists.
    ///
    /// A missing file yields the defaults. An unreadable or invalid file also
    /// falls back to the defaults, with a warning.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file {:?}: {:#}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn projector(&self) -> PropertyExcerpts {
        PropertyExcerpts::from_map(self.excerpts.clone())
    }
}
