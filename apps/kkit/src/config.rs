//! # Configuration
//!
//! Optional `kkit.toml`:
//!
//! ```toml
//! [clock]
//! run_time = 200.0
//! sim_dt = 0.005
//! plot_dt = 1.0
//!
//! [export]
//! model_root = "model"
//! timestamp = false
//! ```
//!
//! Precedence: command-line flags, then the file, then the model document.

use kkit_core::KkitError;
use kkit_core::format::CTIME_FORMAT;
use kkit_core::ingestor::ClockSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "kkit.toml";

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Clock values that replace the model document's own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClockConfig {
    pub run_time: Option<f64>,
    pub sim_dt: Option<f64>,
    pub plot_dt: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Name of the model container, replacing the document's `name`.
    #[serde(default)]
    pub model_root: Option<String>,
    /// `false` writes the Unix epoch instead of the current time, making
    /// repeated exports byte-identical.
    #[serde(default = "default_timestamp")]
    pub timestamp: bool,
}

fn default_timestamp() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            model_root: None,
            timestamp: default_timestamp(),
        }
    }
}

impl ClockConfig {
    /// Overlay onto `base`; set values win.
    #[must_use]
    pub fn apply(self, base: ClockSpec) -> ClockSpec {
        ClockSpec {
            run_time: self.run_time.or(base.run_time),
            sim_dt: self.sim_dt.or(base.sim_dt),
            plot_dt: self.plot_dt.or(base.plot_dt),
        }
    }
}

impl ExportConfig {
    /// `Saved on` text to pin, if timestamps are off.
    #[must_use]
    pub fn pinned_timestamp(&self) -> Option<String> {
        (!self.timestamp).then(|| {
            chrono::DateTime::UNIX_EPOCH
                .format(CTIME_FORMAT)
                .to_string()
        })
    }
}

impl Config {
    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self, KkitError> {
        toml::from_str(text)
            .map_err(|e| KkitError::Serialization(format!("Invalid configuration: {}", e)))
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, KkitError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            KkitError::Io(format!(
                "Cannot read configuration '{}': {}",
                path.display(),
                e
            ))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(KkitError::Serialization(format!(
                "Configuration size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Resolve the configuration for one run.
    ///
    /// An explicit path must exist. Without one, `./kkit.toml` is used when
    /// present; otherwise defaults apply.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, KkitError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(&fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
