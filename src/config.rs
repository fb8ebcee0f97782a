//! Runtime configuration.

use crate::error::{CiteError, Result};
use crate::inspire::InspireOptions;
use crate::monitor::MonitorSettings;
use crate::normalize::NormalizationPolicy;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default data directory: `~/.rustcitewatch`
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".rustcitewatch"))
        .unwrap_or_else(|| PathBuf::from(".rustcitewatch"))
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Where tracked papers, known titles and citation logs live
    pub data_dir: PathBuf,
    pub inspire: InspireOptions,
    pub policy: NormalizationPolicy,
    pub monitor: MonitorSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            inspire: InspireOptions::default(),
            policy: NormalizationPolicy::default(),
            monitor: MonitorSettings::default(),
        }
    }
}

impl Config {
    /// Replace the normalization policy with one read from a JSON file.
    pub fn load_policy(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CiteError::Config(format!("Cannot read policy file {:?}: {}", path, e)))?;
        self.policy = serde_json::from_str(&content)
            .map_err(|e| CiteError::Config(format!("Invalid policy file {:?}: {}", path, e)))?;
        info!(?path, sources = ?self.policy.preferred_sources, "Loaded normalization policy");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.inspire.page_size == 0 {
            return Err(CiteError::Config("page size must be at least 1".to_string()));
        }
        if self.monitor.interval.is_zero() {
            return Err(CiteError::Config("monitor interval must be positive".to_string()));
        }
        Ok(())
    }
}
