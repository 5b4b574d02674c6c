//! Tracker configuration.
//!
//! Loaded once at startup from a TOML file. Only the sweep period and the
//! bridge limits reach the server; everything else is presentation.
//! A missing or broken file falls back to defaults so it can never affect
//! the counters.

use cps_shared::{GlyphTable, TipFormatter, DEFAULT_SWEEP_INTERVAL_MS, DEFAULT_TEMPLATE};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Tip text with `{cps}` and `{combo}` placeholders
    pub template: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Period of the decay sweep in milliseconds
    pub sweep_interval_ms: u64,
    /// Host bridges allowed on the UDP port at once
    pub max_hosts: usize,
    /// Silence after which a host is dropped along with its players
    pub host_timeout_ms: u64,
    pub display: DisplayConfig,
    /// Single characters mapped to the glyphs drawn in their place
    #[serde(rename = "unicode-numbers")]
    pub unicode_numbers: BTreeMap<String, String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            max_hosts: 8,
            host_timeout_ms: 10_000,
            display: DisplayConfig::default(),
            unicode_numbers: BTreeMap::new(),
        }
    }
}

impl TrackerConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.validate();
        Ok(config)
    }

    /// Reads a config file, failing on any I/O or parse problem.
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reads a config file, returning defaults when it is absent or invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match Self::try_load(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Clamps values to ranges the sweep and bridge can work with.
    ///
    /// The sweep must stay well under the one second rate window for the
    /// displayed numbers to stay fresh.
    pub fn validate(&mut self) {
        self.sweep_interval_ms = self.sweep_interval_ms.clamp(50, 1000);
        self.max_hosts = self.max_hosts.clamp(1, 64);
        self.host_timeout_ms = self.host_timeout_ms.clamp(1_000, 300_000);
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn host_timeout(&self) -> Duration {
        Duration::from_millis(self.host_timeout_ms)
    }

    /// Builds the glyph table, skipping keys that are not a single character.
    pub fn glyph_table(&self) -> GlyphTable {
        let mut table = GlyphTable::new();
        for (key, glyph) in &self.unicode_numbers {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => table.insert(c, glyph.clone()),
                _ => warn!("Ignoring glyph mapping for {:?}: key must be one character", key),
            }
        }
        table
    }

    pub fn tip_formatter(&self) -> TipFormatter {
        TipFormatter::new(self.display.template.clone(), self.glyph_table())
    }
}
