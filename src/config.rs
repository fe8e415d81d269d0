//! Viewer configuration
//!
//! All fields have defaults, so an empty JSON object is a valid file:
//!
//! ```json
//! {
//!   "poll_interval_ms": 15,
//!   "monitor": { "voice": 0, "sample_source": 14 },
//!   "log_path": "notes.log"
//! }
//! ```
//!
//! `"monitor": null` turns transition logging off.

use crate::scheduler::DEFAULT_POLL_INTERVAL;
use crate::transition_log::{MonitorTarget, DEFAULT_LOG_FILE};
use crate::{DspViewerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sound viewer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Delay after each pass before the next one, in milliseconds
    pub poll_interval_ms: u64,
    /// Pairing whose note transitions are logged, `None` to disable
    pub monitor: Option<MonitorTarget>,
    /// Note log location
    pub log_path: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            monitor: Some(MonitorTarget::default()),
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl ViewerConfig {
    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            DspViewerError::ConfigError(format!(
                "Failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(DspViewerError::ConfigError(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if let Some(target) = &self.monitor {
            target.validate()?;
        }
        Ok(())
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Builder-style override of the monitored pairing
    pub fn with_monitor(mut self, monitor: Option<MonitorTarget>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Builder-style override of the log path
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Builder-style override of the poll interval
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }
}
